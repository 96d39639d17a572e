//! Threat intelligence sources for urlinfo.
//!
//! Every source implements [`SourceLoader`]. Two variants ship with the crate:
//!
//! - [`FileLoader`]: a static list indexed in memory once at startup
//! - [`HttpLoader`]: a remote lookup service queried per URL

#![doc(html_root_url = "https://docs.rs/urlinfo-sources/0.1.0")]

mod error;
mod file;
mod http;
mod loader;

pub use error::{SourceError, SourceResult};
pub use file::{FileEntry, FileFormat, FileLoader};
pub use http::{HttpLoader, HttpLoaderBuilder, HttpMethod};
pub use loader::SourceLoader;
