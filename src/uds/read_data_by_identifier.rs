//! This service requests named data identifiers from the ECU, using a
//! pre-compiled ODX description of the service's request and response shape.

use std::collections::BTreeMap;

use crate::channel::Transport;
use crate::container::RdbiOutcome;
use crate::error::DiagServerResult;
use crate::param::ParamValue;

use super::OdxDiagnosticSession;

/// Reads a single DID by name and unwraps a positive response into its
/// decoded field map. A negative response is returned unchanged so the
/// caller can inspect its NRC.
pub fn read_data(
    session: &mut OdxDiagnosticSession<impl Transport>,
    name: &str,
) -> DiagServerResult<RdbiOutcome> {
    session.read_data_by_identifier(name)
}

/// Reads several DIDs in one concatenated request and unwraps a positive
/// response into its decoded field maps, in request order.
pub fn read_data_multiple(
    session: &mut OdxDiagnosticSession<impl Transport>,
    names: &[&str],
) -> DiagServerResult<RdbiOutcome> {
    session.read_data_by_identifiers(names)
}

/// Convenience wrapper for the common single-DID, positive-response case:
/// returns `None` if the ECU responded negatively.
pub fn read_data_decoded(
    session: &mut OdxDiagnosticSession<impl Transport>,
    name: &str,
) -> DiagServerResult<Option<BTreeMap<String, ParamValue>>> {
    Ok(read_data(session, name)?.into_single())
}
