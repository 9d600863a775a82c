//! Run-time error type for the ODX-driven diagnostic dispatcher.
//!
//! Compile-time (ODX parsing) errors live in [`crate::odx::OdxError`] and are
//! kept separate: a malformed ODX document can never arise once a
//! [`crate::container::ServiceContainer`] exists, so callers of the dispatcher
//! never need to match on parse-time variants.

use crate::channel::ChannelError;

/// Result type returned by the dispatcher and by the pieces it calls into.
pub type DiagServerResult<T> = Result<T, DiagError>;

#[derive(Debug, PartialEq, Eq)]
/// Everything that can go wrong while running a single UDS exchange.
///
/// A negative response from the ECU is *not* one of these variants - see
/// [`crate::neg_response::NegativeResponse`], which is returned as an `Ok`
/// value, matching the source tool's convention of returning an (empty, if
/// positive) dict rather than raising.
pub enum DiagError {
    /// The DID name (or one of the DID names, for a concatenated request)
    /// is not registered in the [`crate::container::ServiceContainer`].
    UnknownIdentifier(String),
    /// The transport's P2 timer expired before a full response arrived.
    TransportTimeout,
    /// The transport reported a lower-level IO failure.
    TransportIo(String),
    /// The exchange was cancelled while the transport was blocked on I/O.
    Cancelled,
    /// The response's echoed SID did not match the positive-response SID
    /// ODX declared for this service (`request_sid + 0x40`).
    SidMismatch {
        /// SID value compiled from the ODX positive response.
        expected: u8,
        /// SID value actually present in the response.
        actual: u8,
    },
    /// The response's echoed DID did not match the DID this
    /// [`crate::pos_response::PosResponse`] was compiled for.
    DidMismatch {
        /// DID value compiled from ODX.
        expected: u32,
        /// DID value actually present in the response.
        actual: u32,
    },
    /// A [`crate::diag_coded_type::DiagCodedType::MinMaxLength`] field hit
    /// its terminator (or, for `EndOfPdu`, ran out of bytes) before
    /// `min_length` was reached.
    ResponseTooShort,
    /// A [`crate::diag_coded_type::DiagCodedType::MinMaxLength`] field
    /// scanned past `max_length` without finding its terminator.
    ResponseTooLong,
    /// Bytes remained in the response after every requested DID's
    /// [`crate::pos_response::PosResponse`] had consumed its share.
    UnexpectedTrailingBytes {
        /// Number of bytes left over.
        remaining: usize,
    },
    /// A decoder or compiler feature this crate does not support was
    /// encountered at run time.
    NotImplemented(String),
}

impl std::fmt::Display for DiagError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiagError::UnknownIdentifier(name) => {
                write!(f, "identifier '{}' is not registered in this service container", name)
            }
            DiagError::TransportTimeout => write!(f, "transport timed out waiting for a response"),
            DiagError::TransportIo(reason) => write!(f, "transport IO error: {}", reason),
            DiagError::Cancelled => write!(f, "exchange was cancelled"),
            DiagError::SidMismatch { expected, actual } => write!(
                f,
                "response SID mismatch: expected 0x{:02X}, got 0x{:02X}",
                expected, actual
            ),
            DiagError::DidMismatch { expected, actual } => write!(
                f,
                "response DID mismatch: expected 0x{:04X}, got 0x{:04X}",
                expected, actual
            ),
            DiagError::ResponseTooShort => write!(f, "response ended before a field's minimum length"),
            DiagError::ResponseTooLong => write!(f, "response field exceeded its declared maximum length"),
            DiagError::UnexpectedTrailingBytes { remaining } => {
                write!(f, "{} unparsed byte(s) remained after the last DID", remaining)
            }
            DiagError::NotImplemented(what) => write!(f, "unsupported at run time: {}", what),
        }
    }
}

impl std::error::Error for DiagError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

impl From<ChannelError> for DiagError {
    fn from(e: ChannelError) -> Self {
        match e {
            ChannelError::ReadTimeout | ChannelError::WriteTimeout => DiagError::TransportTimeout,
            ChannelError::Cancelled => DiagError::Cancelled,
            other => DiagError::TransportIo(other.to_string()),
        }
    }
}
