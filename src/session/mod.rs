//! Recording session module
//!
//! This module implements the session lifecycle:
//! - SessionState machine and event stream
//! - SessionController driving configure/prepare/start/stop/reset/close

pub mod controller;
pub mod state;

pub use controller::SessionController;
pub use state::{SessionEvent, SessionState};
