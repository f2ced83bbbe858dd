//! Modul-IN: everything between the form and the generator, and back
//!
//! - [`catalog`]: fixed profile-dimension and pedagogical-practice catalogs
//! - [`builder`]: validation and prompt construction per document variant
//! - [`normalizer`]: fence stripping and JSON parsing of generator output
//!
//! # Example
//!
//! ```ignore
//! use modul_in::{build_request, normalize};
//!
//! let request = build_request(&form, DocumentVariant::DeepLearning)?;
//! let raw = client.generate(&request).await?;
//! let payload = normalize(&raw, request.response_format())?;
//! ```

pub mod builder;
pub mod catalog;
pub mod normalizer;

pub use builder::{
    build_request, parse_positive, time_budget, PromptContext, RequestBuilder, ValidatedForm,
};
pub use catalog::{Catalog, Dimension, Practice};
pub use normalizer::{normalize, strip_fences};
