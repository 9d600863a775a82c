//! Per-DID positive-response descriptor: slices one DID's share out of a
//! (possibly multi-DID) response, validates the echoed SID/DID, and decodes
//! its [`Param`]s.

use std::collections::BTreeMap;

use crate::error::DiagError;
use crate::param::{ParamValue, ParsedParam};
use crate::Param;

/// Compiled shape of one DID's positive response, built once from ODX at
/// container-construction time and reused (read-only) for every exchange.
#[derive(Debug, Clone)]
pub struct PosResponse {
    /// Number of bytes the echoed SID occupies (ODX's `SERVICE-ID` param,
    /// typically 1).
    pub sid_length: usize,
    /// The positive-response SID ODX declared, i.e. `request_sid + 0x40`.
    pub sid: u8,
    /// Number of bytes the DID occupies (ODX's `ID` param, typically 2).
    pub did_length: usize,
    /// The DID value this response describes.
    pub did: u32,
    /// Data fields, ordered by ascending `byte_position`.
    pub params: Vec<Param>,
}

impl PosResponse {
    /// Checks that the first `sid_length` bytes of a *full* response (which
    /// may cover several concatenated DIDs) equal this service's positive
    /// SID.
    pub fn check_sid_in_response(&self, resp: &[u8]) -> Result<(), DiagError> {
        if resp.len() < self.sid_length {
            return Err(DiagError::ResponseTooShort);
        }
        let actual = read_be(&resp[..self.sid_length]);
        if actual as u8 != self.sid {
            return Err(DiagError::SidMismatch {
                expected: self.sid,
                actual: actual as u8,
            });
        }
        Ok(())
    }

    /// Checks that the first `did_length` bytes of this DID's slice equal
    /// the DID this `PosResponse` was compiled for.
    pub fn check_did_in_response(&self, did_slice: &[u8]) -> Result<(), DiagError> {
        if did_slice.len() < self.did_length {
            return Err(DiagError::ResponseTooShort);
        }
        let actual = read_be(&did_slice[..self.did_length]);
        if actual != self.did {
            return Err(DiagError::DidMismatch {
                expected: self.did,
                actual,
            });
        }
        Ok(())
    }

    /// Walks `tail` (which begins at this DID's DID bytes) consuming exactly
    /// as many bytes as each [`Param`] requires, in order. Returns the
    /// captured bytes per param and the total length consumed (DID bytes
    /// plus every param's bytes).
    pub fn parse<'a>(&'a self, tail: &[u8]) -> Result<(Vec<ParsedParam<'a>>, usize), DiagError> {
        if tail.len() < self.did_length {
            return Err(DiagError::ResponseTooShort);
        }
        let mut cursor = self.did_length;
        let mut parsed = Vec::with_capacity(self.params.len());
        for param in &self.params {
            let rest = &tail[cursor..];
            let len = param.calculate_length(rest)?;
            if len > rest.len() {
                return Err(DiagError::ResponseTooShort);
            }
            parsed.push(ParsedParam {
                param,
                bytes: rest[..len].to_vec(),
            });
            cursor += len;
        }
        Ok((parsed, cursor))
    }

    /// Decodes every captured param into a `short_name -> value` map.
    pub fn decode(&self, parsed: &[ParsedParam]) -> Result<BTreeMap<String, ParamValue>, DiagError> {
        let mut out = BTreeMap::new();
        for p in parsed {
            out.insert(p.param.short_name.clone(), p.param.decode(&p.bytes)?);
        }
        Ok(out)
    }
}

fn read_be(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0u32, |acc, &b| (acc << 8) | b as u32)
}
