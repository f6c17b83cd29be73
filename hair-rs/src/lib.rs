//! hair-rs library
//!
//! Command definitions and helpers behind the `hair-rs` binary.

pub mod cli;
pub mod commands;
pub mod utils;
