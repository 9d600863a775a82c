//! Detects the ISO 14229 negative-response frame (`0x7F, requested_SID,
//! NRC`) and resolves its label from the ODX-derived NRC table.

use std::collections::BTreeMap;

/// A negative response extracted from an ECU reply.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NegativeResponse {
    /// Raw negative response code.
    pub nrc: u8,
    /// Human-readable label for `nrc`, if ODX's `COMPU-SCALES` table named
    /// one (`LOWER-LIMIT` -> `COMPU-CONST/VT`).
    pub label: Option<String>,
}

/// Compiled once per service from ODX `NEG-RESPONSE-REFS`.
#[derive(Debug, Clone)]
pub struct NegResponseChecker {
    /// Number of bytes the literal `0x7F` marker occupies (typically 1).
    pub sid_length: usize,
    /// The SID this service's requests carry, echoed back at byte
    /// `sid_length` in a negative response.
    pub requested_sid: u8,
    /// NRC -> label table, built from ODX `COMPU-SCALES`.
    pub nrc_labels: BTreeMap<u8, String>,
}

impl NegResponseChecker {
    /// Returns `Some` if `response` is a negative-response frame for this
    /// service's SID, `None` for a positive response.
    pub fn check(&self, response: &[u8]) -> Option<NegativeResponse> {
        if response.len() < self.sid_length + 2 {
            return None;
        }
        if response[..self.sid_length].iter().any(|&b| b != 0x7F) {
            return None;
        }
        if response[self.sid_length] != self.requested_sid {
            return None;
        }
        let nrc = response[self.sid_length + 1];
        Some(NegativeResponse {
            nrc,
            label: self.nrc_labels.get(&nrc).cloned(),
        })
    }
}
