#![cfg_attr(not(test), forbid(unsafe_code))]

//! Shared models and configuration for the console client.
//!
//! The `models` module holds the wire payloads returned by the console API and the
//! section types the stores keep in their snapshots. The `config` module resolves the
//! client configuration from files, environment, and command-line overrides.

pub mod config;
pub mod models;
