//! # urlinfo-cli
//!
//! Command-line front end for the `urlinfo` checker.
//!
//! ## Features
//!
//! - **URL checks**: Check one or many URLs concurrently, with cache and timing details
//! - **Route lookups**: Check a `host[:port]` and path pair the way a lookup service receives it
//! - **Source health**: See which threat lists and endpoints are ready
//! - **Multiple output formats**: Pretty tables or JSON

pub mod cli;
pub mod config;
pub mod output;

pub use cli::run;
