//! HTTP server exposing the Chirpy identity core.

pub mod api;
pub mod config;
pub mod logging;
