use nova_jdwp::{JdwpError, Location, ReferenceTypeId, VirtualMachine};

use crate::config::ResolutionConfig;
use crate::source::SourcePosition;

/// Executable locations of `ty` on the line of `position`.
///
/// Source lines are zero-based, VM lines one-based. VMs new enough to
/// understand strata are queried in the configured stratum. Types without
/// line tables (synthetic closures, generated accessors) and any other VM
/// failure yield no locations.
pub fn locations_of_line(
    vm: &dyn VirtualMachine,
    config: &ResolutionConfig,
    ty: ReferenceTypeId,
    position: &SourcePosition,
) -> Vec<Location> {
    let line = position.line.saturating_add(1);
    let stratum = vm
        .version_at_least(&config.strata_min_vm_version)
        .then_some(config.stratum.as_str());

    match vm.locations_of_line(ty, stratum, line) {
        Ok(locations) => locations,
        Err(err @ (JdwpError::AbsentInformation(_) | JdwpError::NotPrepared(_))) => {
            tracing::debug!(ty, line, error = %err, "no line locations");
            Vec::new()
        }
        Err(err) => {
            tracing::warn!(ty, line, error = %err, "line location query failed");
            Vec::new()
        }
    }
}
