//! Compile-time error type: everything that can go wrong while turning an
//! ODX document into a [`crate::container::ServiceContainer`].

/// Result type for ODX compilation.
pub type OdxResult<T> = Result<T, OdxError>;

#[derive(Debug)]
/// Reasons an ODX document could not be compiled into service descriptors.
///
/// These abort construction of the container being built; they never appear
/// once a [`crate::container::ServiceContainer`] exists, so dispatch-time
/// code (see [`crate::error::DiagError`]) never needs to handle them.
pub enum OdxError {
    /// The XML itself did not parse.
    MalformedXml {
        /// Description of the parser failure.
        reason: String,
    },
    /// A required element or `ID-REF` target was missing.
    MissingElement {
        /// The element path or `ID-REF` that could not be resolved.
        id_ref: String,
    },
    /// An ODX construct this crate's compiler does not support was
    /// encountered (e.g. a `DIAG-CODED-TYPE` variant other than
    /// `STANDARD-LENGTH-TYPE`/`MIN-MAX-LENGTH-TYPE`).
    UnsupportedConstruct {
        /// Name of the unsupported feature.
        feature: String,
    },
    /// A `DIAG-SERVICE` used `END-OF-PDU` termination on a DID that is not
    /// the last DID-capable of appearing in a concatenated multi-DID
    /// request; the byte count such a DID would consume can't be
    /// determined without additional framing (SPEC_FULL.md §9.4).
    AmbiguousEndOfPdu {
        /// Human-readable name of the offending DID.
        name: String,
    },
}

impl std::fmt::Display for OdxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OdxError::MalformedXml { reason } => write!(f, "malformed ODX document: {}", reason),
            OdxError::MissingElement { id_ref } => {
                write!(f, "ODX document is missing required element/reference '{}'", id_ref)
            }
            OdxError::UnsupportedConstruct { feature } => {
                write!(f, "unsupported ODX construct: {}", feature)
            }
            OdxError::AmbiguousEndOfPdu { name } => write!(
                f,
                "DID '{}' uses END-OF-PDU termination and cannot safely be concatenated with other DIDs",
                name
            ),
        }
    }
}

impl std::error::Error for OdxError {}
