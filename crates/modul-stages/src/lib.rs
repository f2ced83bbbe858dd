//! Modul Stages: pipeline orchestration and per-session state
//!
//! # Pipeline Flow
//!
//! ```text
//! FormInput → build → generate → normalize → adapt → render → RenderedDocument
//!              pure    network      pure      pure    pure
//! ```
//!
//! [`Pipeline`] runs the stages. [`Session`] wraps one teacher's work: at
//! most one generation in flight, a guard token against stale results, and
//! a letterhead cache shared by that session's exports.

mod pipeline;
mod session;

pub use pipeline::{
    Pipeline, Prepared, RenderedDocument, BUILD_STAGE, NORMALIZE_STAGE, RENDER_STAGE,
};
pub use session::{FailureInfo, Session, SessionState, SessionStatus, Submission};
