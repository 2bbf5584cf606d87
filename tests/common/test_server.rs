use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::LazyLock;
use std::time::Duration;

use tempfile::TempDir;

/// Spawns the release binary against a scratch data directory and tears it
/// down on drop.
pub struct TestServer {
    pub base_url: String,
    _data_dir: TempDir,
    child: Child,
}

static BINARY: LazyLock<PathBuf> = LazyLock::new(|| {
    let status = Command::new("cargo")
        .args(["build", "--release"])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .expect("build release binary");
    assert!(status.success(), "release build failed");
    Path::new(env!("CARGO_MANIFEST_DIR")).join("target/release/shellac")
});

fn free_port() -> u16 {
    let probe = TcpListener::bind("127.0.0.1:0").expect("bind probe socket");
    probe.local_addr().expect("probe addr").port()
}

impl TestServer {
    pub async fn start() -> Self {
        let data_dir = TempDir::new().expect("create scratch dir");
        let port = free_port();
        let base_url = format!("http://127.0.0.1:{port}");

        let child = Command::new(&*BINARY)
            .arg("--host")
            .arg("127.0.0.1")
            .arg("--port")
            .arg(port.to_string())
            .arg("--data-dir")
            .arg(data_dir.path())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .expect("spawn server");

        let server = Self {
            base_url,
            _data_dir: data_dir,
            child,
        };
        server.wait_until_ready().await;
        server
    }

    async fn wait_until_ready(&self) {
        let client = reqwest::Client::new();
        let health = format!("{}/health", self.base_url);
        for _ in 0..50 {
            if client.get(&health).send().await.is_ok() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        panic!("server at {} never became ready", self.base_url);
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
