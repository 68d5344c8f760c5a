//! Fill pincodes that have no coordinate at all

use crate::strategies::GeocodeStrategy;
use pincode_geo::{CoordinateStore, Pincode};
use tracing::{info, warn};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MissingFetchOutcome {
    pub found: usize,
    pub not_found: Vec<Pincode>,
}

/// Look up each pincode once with `strategy` and merge the answers into
/// `store`. Lookup errors count as not found.
pub async fn fetch_missing(
    strategy: &dyn GeocodeStrategy,
    pincodes: &[Pincode],
    store: &mut CoordinateStore,
) -> MissingFetchOutcome {
    let mut outcome = MissingFetchOutcome::default();
    let total = pincodes.len();

    for (i, pincode) in pincodes.iter().enumerate() {
        match strategy.lookup(pincode).await {
            Ok(Some(hit)) => {
                let coord = hit.coordinate.rounded();
                info!("[{}/{}] {}: {}", i + 1, total, pincode, coord);
                store.insert(pincode.clone(), coord);
                outcome.found += 1;
            }
            Ok(None) => {
                warn!("[{}/{}] Not found: {}", i + 1, total, pincode);
                outcome.not_found.push(pincode.clone());
            }
            Err(e) => {
                warn!("[{}/{}] Error for {}: {}", i + 1, total, pincode, e);
                outcome.not_found.push(pincode.clone());
            }
        }
        tokio::time::sleep(strategy.delay()).await;
    }

    outcome
}
