//! Core types and errors for the urlinfo URL checker.
//!
//! This crate provides the foundational types shared by the loaders and the
//! orchestrator:
//!
//! - **URLs**: [`NormalizedUrl`], the canonical cache key and loader input
//! - **Types**: per-source [`ThreatInfo`], the aggregated [`Verdict`], loader
//!   and service health
//! - **Errors**: the service error taxonomy in [`UrlinfoError`]
//!
//! # Example
//!
//! ```rust,ignore
//! use urlinfo_core::{NormalizedUrl, Result};
//!
//! fn key_for(raw: &str) -> Result<String> {
//!     let url = NormalizedUrl::parse(raw)?;
//!     Ok(url.as_str().to_string())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/urlinfo-core/0.1.0")]

mod error;
mod normalize;
pub mod types;

pub use error::{Result, UrlinfoError};
pub use normalize::{NormalizedUrl, MAX_URL_LENGTH};
pub use types::*;
