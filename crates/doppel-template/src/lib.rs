//! Response rendering for simulated endpoints.
//!
//! Two units live here, in dependency order:
//! - [`interpolate::render`]: substitutes `{{request.body.X}}` /
//!   `{{request.query.X}}` placeholders through a JSON template without
//!   mutating it.
//! - [`transform::apply`]: runs a declarative [`TransformProgram`] over a
//!   working `{status, body}` copy. Programs are data, not code; there is
//!   nothing to sandbox.

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

pub mod interpolate;
pub mod transform;

pub use interpolate::render;
pub use transform::{apply, TransformError};

pub use doppel_types::{TransformOp, TransformProgram};
