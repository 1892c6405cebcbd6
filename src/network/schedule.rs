use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::unit::Unit;

/// Partitions `units` into dependency waves.
///
/// `units[i]` must carry index `i`. A unit lands in the first wave after
/// every unit it connects to, so the units of one wave never depend on each
/// other. Fails with [`Error::CyclicDependency`] when some units can never
/// become ready.
pub fn build_waves(units: &[Unit]) -> Result<Vec<Vec<usize>>> {
    let mut ready = vec![false; units.len()];
    let mut scheduled = 0;
    let mut waves = Vec::new();

    while scheduled < units.len() {
        let mut wave = Vec::new();
        for (i, unit) in units.iter().enumerate() {
            if !ready[i] && unit.can_update(&ready)? {
                wave.push(i);
            }
        }

        if wave.is_empty() {
            let unscheduled = units.len() - scheduled;
            warn!(unscheduled, "dependency cycle, schedule cannot be completed");
            return Err(Error::CyclicDependency { unscheduled });
        }

        // Readiness is only published once the wave is complete, so no
        // member can depend on another member.
        for &i in &wave {
            ready[i] = true;
        }
        scheduled += wave.len();
        trace!(wave = waves.len(), size = wave.len(), "wave formed");
        waves.push(wave);
    }

    debug!(units = units.len(), waves = waves.len(), "schedule built");
    Ok(waves)
}
