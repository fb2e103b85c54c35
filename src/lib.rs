//! fxconv library
//!
//! Exchange-rate caching and currency conversion. The binary in `main.rs` is a
//! thin shell over these modules; they are public for integration tests.

pub mod app;
pub mod cache;
pub mod cli;
pub mod convert;
pub mod currency;
pub mod data;
pub mod prompt;
