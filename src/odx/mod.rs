//! Compiles ODX (ISO 22901-1) documents into the runtime types in
//! [`crate::container`], [`crate::pos_response`], and friends.
//!
//! This is a compile-time-only layer: once [`compiler::compile_rdbi`]
//! returns a [`crate::container::ServiceContainer`], nothing here is
//! consulted again for the lifetime of that container.

pub mod compiler;
pub mod document;
pub mod error;

pub use compiler::compile_rdbi;
pub use error::{OdxError, OdxResult};
