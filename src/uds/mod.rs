//! Module for UDS (Unified diagnostic services - ISO14229) Read Data By
//! Identifier, driven by a compiled ODX [`crate::container::ServiceContainer`].
//!
//! Theoretically, this module should work against any ECU whose ODX
//! description uses the standard RDBI (SID 0x22) request/response shape
//! (typically any ECU produced after 2006 supports this).

pub mod read_data_by_identifier;

use crate::channel::Transport;
use crate::container::{RdbiOutcome, RdbiRequest, ServiceContainer};
use crate::error::DiagServerResult;
use crate::odx::{compile_rdbi, OdxResult};

/// A live Read-Data-By-Identifier session: a compiled [`ServiceContainer`]
/// paired with the transport it talks over.
///
/// This is the crate's front door - most callers construct one of these
/// rather than driving [`ServiceContainer::read_data_by_identifier`]
/// directly.
#[derive(Debug)]
pub struct OdxDiagnosticSession<T: Transport> {
    container: ServiceContainer,
    transport: T,
}

impl<T: Transport> OdxDiagnosticSession<T> {
    /// Compiles `odx_xml` and pairs the result with `transport`.
    pub fn new_over_transport(odx_xml: &str, transport: T) -> OdxResult<Self> {
        let container = compile_rdbi(odx_xml)?;
        Ok(Self { container, transport })
    }

    /// Wraps an already-compiled container, e.g. one shared across several
    /// sessions over distinct transports.
    pub fn with_container(container: ServiceContainer, transport: T) -> Self {
        Self { container, transport }
    }

    /// Number of DID names this session's container knows how to read.
    pub fn len(&self) -> usize {
        self.container.len()
    }

    /// `true` if the compiled container has no registered DID names.
    pub fn is_empty(&self) -> bool {
        self.container.is_empty()
    }

    /// Reads a single DID by its ODX `DiagInstanceName`.
    pub fn read_data_by_identifier(&mut self, name: &str) -> DiagServerResult<RdbiOutcome> {
        self.container
            .read_data_by_identifier(&mut self.transport, RdbiRequest::Single(name))
    }

    /// Reads several DIDs, concatenated into one request in the given order.
    pub fn read_data_by_identifiers(&mut self, names: &[&str]) -> DiagServerResult<RdbiOutcome> {
        self.container
            .read_data_by_identifier(&mut self.transport, RdbiRequest::Multiple(names))
    }

    /// Borrows the compiled container, e.g. to inspect registered names.
    pub fn container(&self) -> &ServiceContainer {
        &self.container
    }

    /// Borrows the underlying transport.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }
}
