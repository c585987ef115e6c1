//! Shared filesystem helpers.

pub mod files;

pub use files::{set_mode, write_file_mode};
