//! A single named field within a positive response, and the typed value it
//! decodes to.

use crate::diag_coded_type::{BaseDataType, DiagCodedType, Termination};
use crate::error::DiagError;

/// A decoded parameter value.
///
/// `A_UINT32` and any unmodeled base type both decode to [`ParamValue::Bytes`]
/// (the caller interprets the raw bytes), matching `param.py::decode`'s
/// `A_UINT32` and fallback branches, which are identical.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ParamValue {
    /// `A_ASCIISTRING` decoded as text.
    Text(String),
    /// Any other base type, as the raw bytes captured for this field (with
    /// any `MinMaxLength` terminator already stripped).
    Bytes(Vec<u8>),
}

/// A named field at a byte position within a DID's response body, bound to a
/// [`DiagCodedType`].
///
/// Unlike the source tool, a `Param` never holds per-call captured bytes:
/// [`crate::pos_response::PosResponse::parse`] returns a [`ParsedParam`]
/// list instead of mutating the `Param`, so `ServiceContainer` stays
/// immutable and safely shareable across concurrent exchanges (see
/// SPEC_FULL.md §3, "Lifecycle").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    /// Human-readable field name, used as the decode-result map key.
    pub short_name: String,
    /// Byte offset of this field relative to the start of the DID's data
    /// (i.e. after the DID bytes), per ODX `BYTE-POSITION`.
    pub byte_position: usize,
    /// Length/decode semantics for this field.
    pub diag_coded_type: DiagCodedType,
}

/// The bytes [`PosResponse::parse`](crate::pos_response::PosResponse::parse)
/// captured for one [`Param`] during a single exchange.
#[derive(Debug, Clone)]
pub struct ParsedParam<'a> {
    /// The descriptor this capture belongs to.
    pub param: &'a Param,
    /// The captured bytes, including any terminator.
    pub bytes: Vec<u8>,
}

impl Param {
    /// Bytes this field consumes at the front of `tail`.
    pub fn calculate_length(&self, tail: &[u8]) -> Result<usize, DiagError> {
        self.diag_coded_type.calculate_length(tail)
    }

    /// Decodes previously-captured bytes into a typed value.
    pub fn decode(&self, bytes: &[u8]) -> Result<ParamValue, DiagError> {
        let payload = match &self.diag_coded_type {
            DiagCodedType::MinMaxLength {
                termination: Termination::Zero | Termination::HexFf,
                ..
            } => &bytes[..bytes.len().saturating_sub(1)],
            _ => bytes,
        };
        let base_data_type = match &self.diag_coded_type {
            DiagCodedType::StandardLength { base_data_type, .. } => base_data_type,
            DiagCodedType::MinMaxLength { base_data_type, .. } => base_data_type,
        };
        Ok(match base_data_type {
            BaseDataType::AsciiString => {
                ParamValue::Text(payload.iter().map(|&b| b as char).collect())
            }
            BaseDataType::Uint32 | BaseDataType::Other(_) => ParamValue::Bytes(payload.to_vec()),
        })
    }
}
