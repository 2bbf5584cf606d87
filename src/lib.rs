//! # Shellac
//!
//! A self-hostable media catalog backend, usable both as a standalone
//! binary and as a library.
//!
//! Catalog rows live in SQLite, asset payloads in a filesystem object
//! store, and search documents in an in-memory index; the
//! [`catalog::Catalog`] coordinator keeps the three consistent. Access is
//! gated by capability tokens with a sliding expiration.
//!
//! ## Library Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use shellac::config::ServerConfig;
//! use shellac::server::{AppState, create_router};
//! use shellac::store::{CatalogStore, SqliteCatalog};
//!
//! let config = ServerConfig::default();
//! let store = SqliteCatalog::new(config.db_path()).unwrap();
//! store.initialize().unwrap();
//!
//! let state = Arc::new(AppState::new(Arc::new(store), &config));
//! let router = create_router(state);
//! // Serve with axum...
//! ```

pub mod audit;
pub mod auth;
pub mod blob;
pub mod catalog;
pub mod config;
pub mod error;
pub mod search;
pub mod server;
pub mod session;
pub mod store;
pub mod types;
