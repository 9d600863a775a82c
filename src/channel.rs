//! Module for the logical transport boundary between the dispatcher and an
//! ECU.
//!
//! The dispatcher in [`crate::container`] only ever needs one operation from
//! the world below it: hand over request bytes, block until the reassembled
//! application-layer response arrives (or the P2 timer expires). Everything
//! below that - ISO-TP (ISO 15765-2) segmentation, flow control, frame
//! padding, CAN arbitration - is the transport's concern and out of scope
//! for this crate; see [`TransportConfig`] for the fields such a transport is
//! constructed from.

/// Result type for the transport boundary.
pub type ChannelResult<T> = Result<T, ChannelError>;

#[derive(Debug)]
/// Error produced by a transport implementation.
pub enum ChannelError {
    /// Underlying IO error with the channel.
    IOError(std::io::Error),
    /// The P2 timer expired while writing the request.
    WriteTimeout,
    /// The P2 timer expired while waiting for the response.
    ReadTimeout,
    /// The exchange was cancelled while the transport was blocked on I/O.
    Cancelled,
    /// Underlying API error with hardware below the transport.
    APIError {
        /// Name of the API, e.g. `"socketCAN"`, `"Passthru"`.
        api_name: String,
        /// Internal API error code.
        code: u8,
        /// API error description.
        desc: String,
    },
}

impl std::fmt::Display for ChannelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChannelError::IOError(e) => write!(f, "IO error: {}", e),
            ChannelError::WriteTimeout => write!(f, "timeout writing request to channel"),
            ChannelError::ReadTimeout => write!(f, "timeout reading response from channel"),
            ChannelError::Cancelled => write!(f, "channel exchange cancelled"),
            ChannelError::APIError { api_name, code, desc } => {
                write!(f, "underlying {} API error ({}): {}", api_name, code, desc)
            }
        }
    }
}

impl std::error::Error for ChannelError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        if let Self::IOError(io_err) = self {
            Some(io_err)
        } else {
            None
        }
    }
}

/// Addressing mode used by the ISO-TP transport below this crate.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AddressingType {
    /// Physical (1-to-1) addressing.
    Normal,
    /// Normal addressing, fixed format (29-bit CAN ID).
    NormalFixed,
    /// Extended addressing (first payload byte carries the target address
    /// extension).
    Extended,
    /// Mixed addressing.
    Mixed,
}

/// UDS-layer transport protocol selection.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TransportProtocol {
    /// ISO 15765-2 (ISO-TP) over CAN.
    Can,
}

/// Configuration consumed at transport-construction time.
///
/// These fields flow straight through to the ISO-TP transport constructor;
/// this crate's dispatcher never reads them itself, it only needs them
/// available so a session can be built in one call. Field set and names
/// follow the external interface enumerated for this crate's ODX-driven
/// core.
#[derive(Debug, Copy, Clone)]
pub struct TransportConfig {
    /// ISO-TP addressing mode.
    pub addressing_type: AddressingType,
    /// Network source address.
    pub n_sa: u16,
    /// Network target address.
    pub n_ta: u16,
    /// Network address extension.
    pub n_ae: u16,
    /// UDS-layer transport protocol.
    pub transport_protocol: TransportProtocol,
    /// If `true`, negative responses are swallowed by the transport rather
    /// than delivered up to the dispatcher.
    pub discard_neg_resp: bool,
    /// CAN arbitration ID used for outgoing requests.
    pub req_id: u32,
    /// CAN arbitration ID the transport expects responses on.
    pub res_id: u32,
    /// Client-side response timeout (P2), in seconds.
    pub p2_can_client: f32,
    /// Server-side response timeout (P2), in seconds.
    pub p2_can_server: f32,
}

/// The contract this crate's core needs from whatever moves bytes to and
/// from the ECU.
///
/// `send` is synchronous: it blocks until either the reassembled
/// application-layer response is available or the P2 timer expires. Frame
/// segmentation, flow control and padding happen below this trait.
pub trait Transport: Send {
    /// Writes `request` to the ECU and blocks for its response.
    fn send(&mut self, request: &[u8]) -> ChannelResult<Vec<u8>>;
}
