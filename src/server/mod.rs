mod account;
mod admin;
pub mod dto;
pub mod response;
mod router;
mod user;

pub use router::{AppState, create_router};
