//! Fire-and-forget audit trail.
//!
//! Events go through dedicated `tracing` targets so deployments can route
//! them to their own sink with an `EnvFilter` directive. Emitting an event
//! can never fail the operation it records.

use serde_json::Value;
use tracing::info;

pub fn user_action(user_id: i64, action: &str, data: Option<&Value>) {
    match data {
        Some(data) => info!(target: "audit::user", user_id, action, data = %data),
        None => info!(target: "audit::user", user_id, action),
    }
}

pub fn admin_action(user_id: i64, action: &str, data: Option<&Value>) {
    match data {
        Some(data) => info!(target: "audit::admin", user_id, action, data = %data),
        None => info!(target: "audit::admin", user_id, action),
    }
}
