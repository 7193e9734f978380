//! Lookup Backend Integration
//!
//! Access to the remote username lookup service through a common trait.
//!
//! # Available Backends
//!
//! - **HTTP**: `GET {base}/search?username=...` against the hosted service
//!
//! # Usage
//!
//! ```ignore
//! use footprint_core::backend::{HttpLookupBackend, LookupBackend};
//!
//! let backend = HttpLookupBackend::new("https://gosearch-tg-app.vercel.app")?;
//! let raw = backend.fetch(&SearchQuery::parse("alice")?).await?;
//! ```

mod http;
mod traits;

pub use http::HttpLookupBackend;
pub use traits::{LookupBackend, RawResponse};
