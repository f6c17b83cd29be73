//! Command implementations

pub mod build;
pub mod dump;
pub mod info;
pub mod validate;
