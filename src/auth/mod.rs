mod gate;
mod password;

pub use gate::{GateError, RequireAdmin, RequireUser};
pub use password::{hash_password, verify_password};
