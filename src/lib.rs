//! # Scoresheet
//!
//! A scoreboard server for team competitions, usable both as a standalone
//! binary and as a library.
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! scoresheet = { version = "0.0.1", default-features = false }
//! ```
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use scoresheet::config::ServerConfig;
//! use scoresheet::server::{AppState, create_router};
//! use scoresheet::store::{SqliteStore, Store};
//!
//! let config = ServerConfig::default();
//! let store = SqliteStore::new(config.db_path()).unwrap();
//! store.initialize().unwrap();
//!
//! let state = Arc::new(AppState::new(Arc::new(store), config));
//! let router = create_router(state);
//! // Serve with axum...
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Builds the `scoresheet` binary. Disable with `default-features = false`.

pub mod auth;
pub mod config;
pub mod error;
pub mod server;
pub mod service;
pub mod store;
pub mod types;
pub mod uploads;
