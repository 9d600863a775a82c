//! A [`Transport`] backed by an exact request-bytes -> response-bytes map,
//! for driving the dispatcher in tests without real hardware.

use std::collections::HashMap;

use crate::channel::{ChannelError, ChannelResult, Transport};

/// Simulated ECU: replies with a pre-loaded response for each exact request,
/// and reports [`ChannelError::ReadTimeout`] for anything unrecognized.
#[derive(Debug, Clone, Default)]
pub struct SimulationTransport {
    responses: HashMap<Vec<u8>, Vec<u8>>,
}

impl SimulationTransport {
    /// Creates an empty simulation with no canned responses.
    pub fn new() -> Self {
        Self {
            responses: HashMap::new(),
        }
    }

    /// Registers the bytes the ECU should reply with for an exact request.
    pub fn add_response(&mut self, request: &[u8], response: &[u8]) {
        self.responses.insert(request.to_vec(), response.to_vec());
    }
}

impl Transport for SimulationTransport {
    fn send(&mut self, request: &[u8]) -> ChannelResult<Vec<u8>> {
        self.responses
            .get(request)
            .cloned()
            .ok_or(ChannelError::ReadTimeout)
    }
}
