//! Command implementations for offsync.
//!
//! Each command returns the text to print; `main` does the printing.

mod completions;
mod pile;

pub use completions::{completions, generate_completions, shell_from_str};
pub use pile::{enqueue, list, outbox, purge, status, submit, sync};
