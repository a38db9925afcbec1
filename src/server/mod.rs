mod admin;
mod dashboard;
pub mod dto;
mod public;
pub mod response;
mod router;
mod session;
mod user;

pub use router::{AppState, create_router};
