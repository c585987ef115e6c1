//! nw-install library exports.
//!
//! The binary is a thin clap front end over these modules; integration
//! tests drive the pipeline through the same API with fake external
//! systems.

pub mod activate;
pub mod commands;
pub mod common;
pub mod config;
pub mod deploy;
pub mod error;
pub mod locate;
pub mod packages;
pub mod pipeline;
pub mod plan;
pub mod preflight;
pub mod privilege;
pub mod process;
pub mod render;
pub mod telemetry;
pub mod timing;
