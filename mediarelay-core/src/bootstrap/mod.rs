//! Bootstrap module for initializing the relay
//!
//! This module handles configuration loading; the binary wires the rest.

pub mod config;

pub use config::load_config;
