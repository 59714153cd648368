//! CMDB topology server
//!
//! Business lifecycle, status state machine and owner-scoped business search
//! over pluggable stores.

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod models;
pub mod services;
pub mod state;

pub use error::{Error, Result};
