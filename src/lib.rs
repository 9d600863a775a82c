#![deny(
    missing_docs,
    missing_debug_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_imports,
    unused_import_braces,
    unused_qualifications
)]

//! A crate which compiles ODX (ISO 22901-1) diagnostic layer descriptions
//! into executable UDS (ISO 14229) Read Data By Identifier service
//! descriptors, and dispatches requests against them.
//!
//! ## Read Data By Identifier (RDBI, SID 0x22)
//!
//! Given an ODX document, [`odx::compile_rdbi`] walks its `DIAG-SERVICE`
//! elements and produces a [`container::ServiceContainer`]: one
//! [`container::ServiceDescriptor`] per named data identifier, each knowing
//! how to build the request bytes, recognize a negative response, and slice
//! and decode a positive response's parameters.
//!
//! A compiled container is immutable and `Send + Sync` for its whole
//! lifetime - no per-call state is mutated anywhere in this crate, so one
//! container can safely back concurrent exchanges over distinct transports.
//!
//! ## What this crate does not do
//!
//! This crate implements the RDBI service only, and does not perform ISO-TP
//! (ISO 15765-2) frame segmentation, flow control, diagnostic session
//! management, security access, or any other UDS service. See
//! [`channel::Transport`] for the boundary below which those concerns live.

pub mod channel;
pub mod container;
pub mod diag_coded_type;
pub mod error;
pub mod neg_response;
pub mod odx;
pub mod param;
pub mod pos_response;
pub mod simulation;
pub mod uds;

pub use error::{DiagError, DiagServerResult};
pub use param::Param;
