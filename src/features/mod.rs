//! Feature implementations for offsync.
//!
//! - Offline action pile and registry
//! - Contact form delivered through the pile

pub mod forms;
pub mod sync;
