//! # Configuration
//!
//! Client configuration: where the console API lives, how requests are sent, and how
//! the command-line front end logs.

pub mod client;

pub use client::{ClientConfig, ConfigError, LogFormat, LoggingConfig};
