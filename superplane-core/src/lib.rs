//! # SuperPlane Core Library
//!
//! Config contexts, output rendering, command binding and the API client
//! shared by the `superplane` CLI.

pub mod client;
pub mod command;
pub mod config;
pub mod error;
pub mod models;
pub mod render;
pub mod resource;
pub mod selector;
pub mod services;

pub use error::{CliError, CliResult};
