//! Block classification

use contracts::{Block, BlockCorrection, ContractError, SyncEngineConfig};

/// Decide how a block must be corrected against the nominal `interval`
///
/// Surplus spans of a whole multiple of the interval are read as missed
/// ticks and unwrapped before the remainder is judged. A remaining surplus
/// or a deficit beyond the configured tolerance is an `UnresolvedAnomaly`.
pub fn classify(
    block: &Block,
    interval: u64,
    config: &SyncEngineConfig,
) -> Result<BlockCorrection, ContractError> {
    let span = block.span();
    let anomaly = || ContractError::UnresolvedAnomaly {
        block: block.index,
        start_frame: block.start_frame,
        end_frame: block.end_frame,
        drift: block.drift(interval),
        interval,
    };

    if span >= interval {
        let mut surplus = span - interval;
        let mut missed_ticks = 0;
        if surplus >= interval {
            missed_ticks = surplus / interval;
            surplus %= interval;
        }

        if surplus == 0 {
            return Ok(if missed_ticks == 0 {
                BlockCorrection::Balanced
            } else {
                BlockCorrection::Unwrapped { missed_ticks }
            });
        }
        if config.exceeds_tolerance(surplus, interval) {
            return Err(anomaly());
        }
        Ok(BlockCorrection::Surplus {
            dropped: surplus as usize,
            missed_ticks,
        })
    } else {
        let deficit = interval - span;
        if config.exceeds_tolerance(deficit, interval) {
            return Err(anomaly());
        }
        Ok(BlockCorrection::Deficit {
            inserted: deficit as usize,
        })
    }
}
