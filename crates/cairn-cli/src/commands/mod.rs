//! CLI command implementations

pub mod add;
pub mod find;
