//! Sequential, checkpointed resolution of a pincode list

use crate::chain::{FallbackChain, Resolution};
use crate::progress::{Progress, ProgressEntry};
use crate::{ResolverConfig, Result};
use pincode_geo::{CoordinateStore, Pincode, PINCODE_LEN};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{info, warn};

/// Counts for one run; earlier runs' results live in [`Progress`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchStats {
    pub updated: usize,
    pub unchanged: usize,
    pub failed: usize,
    /// Already answered by an earlier run
    pub skipped: usize,
    /// Stopped early on a shutdown request
    pub interrupted: bool,
}

impl BatchStats {
    pub fn attempted(&self) -> usize {
        self.updated + self.unchanged + self.failed
    }
}

/// Read a pincode list, one per line. Lines that are not exactly six
/// digits after trimming are skipped.
pub fn load_pincode_list(path: impl AsRef<Path>) -> Result<Vec<Pincode>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    let mut pincodes = Vec::new();
    let mut skipped = 0;

    for line in content.lines() {
        let line = line.trim();
        if line.len() != PINCODE_LEN {
            if !line.is_empty() {
                skipped += 1;
            }
            continue;
        }
        match Pincode::new(line) {
            Ok(p) => pincodes.push(p),
            Err(_) => {
                warn!("Skipping malformed pincode line {:?}", line);
                skipped += 1;
            }
        }
    }

    info!(
        "Loaded {} pincodes from {:?} ({} lines skipped)",
        pincodes.len(),
        path,
        skipped
    );
    Ok(pincodes)
}

/// Resolve `pincodes` in order starting at `progress.last_index`.
///
/// Progress is written to `progress_path` every `checkpoint_every`
/// pincodes, when `shutdown` is raised, and at the end.
pub async fn resolve_pending(
    chain: &FallbackChain,
    pincodes: &[Pincode],
    store: &CoordinateStore,
    progress: &mut Progress,
    progress_path: &Path,
    config: &ResolverConfig,
    shutdown: &AtomicBool,
) -> Result<BatchStats> {
    let total = pincodes.len();
    let mut stats = BatchStats::default();

    info!(
        "Resolving {} pincodes ({} already processed, starting at index {})",
        total,
        progress.processed.len(),
        progress.last_index
    );

    for (i, pincode) in pincodes.iter().enumerate().skip(progress.last_index) {
        if shutdown.load(Ordering::SeqCst) {
            warn!("Shutdown requested, stopping at index {}", i);
            stats.interrupted = true;
            break;
        }

        if progress.is_done(pincode) {
            stats.skipped += 1;
            progress.last_index = i + 1;
            continue;
        }

        let existing = store.get(pincode);
        info!("[{}/{}] Processing {}", i + 1, total, pincode);

        match chain.resolve(pincode, existing).await {
            Resolution::Updated(hit) => {
                let new = hit.coordinate.rounded();
                info!("  {} -> {} ({})", pincode, new, hit.source);
                progress.processed.insert(
                    pincode.clone(),
                    ProgressEntry::Updated {
                        old: existing.copied(),
                        new,
                        source: hit.source,
                    },
                );
                stats.updated += 1;
            }
            Resolution::Unchanged(_) => {
                info!("  {}: same coordinate returned, keeping existing", pincode);
                progress
                    .processed
                    .insert(pincode.clone(), ProgressEntry::unchanged());
                stats.unchanged += 1;
            }
            Resolution::NotFound => {
                warn!("  {}: no coordinates found", pincode);
                progress.record_failed(pincode.clone());
                stats.failed += 1;
            }
        }

        progress.last_index = i + 1;

        if (i + 1) % config.checkpoint_every == 0 {
            progress.save(progress_path)?;
            info!("Progress saved ({}/{})", i + 1, total);
        }
        if (i + 1) % config.stats_every == 0 {
            info!(
                "Updated: {}, Unchanged: {}, Failed: {}",
                stats.updated, stats.unchanged, stats.failed
            );
        }
    }

    progress.save(progress_path)?;
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::tests::MockStrategy;
    use pincode_geo::Coordinate;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;
    use tempfile::tempdir;

    fn pin(s: &str) -> Pincode {
        Pincode::new(s).unwrap()
    }

    fn store() -> CoordinateStore {
        ["560001", "560002", "560003"]
            .iter()
            .map(|p| (pin(p), Coordinate { lat: 12.9716, lng: 77.5946 }))
            .collect()
    }

    fn chain_with(answer: Option<Coordinate>) -> (FallbackChain, Arc<AtomicUsize>) {
        let strategy = MockStrategy::answering("mock", answer);
        let calls = strategy.calls.clone();
        (FallbackChain::new(vec![Box::new(strategy)], 0.001), calls)
    }

    #[test]
    fn test_load_pincode_list_filters_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pincodes.txt");
        fs::write(&path, "560001\n 560002 \n\n12345\n56A001\n5600011\n").unwrap();
        let list = load_pincode_list(&path).unwrap();
        assert_eq!(list, vec![pin("560001"), pin("560002")]);
    }

    #[tokio::test]
    async fn test_updates_recorded_and_checkpointed() {
        let dir = tempdir().unwrap();
        let progress_path = dir.path().join("fetch_progress.json");
        let (chain, _) = chain_with(Some(Coordinate { lat: 12.93, lng: 77.62 }));
        let pincodes = vec![pin("560001"), pin("560002")];
        let mut progress = Progress::default();

        let stats = resolve_pending(
            &chain,
            &pincodes,
            &store(),
            &mut progress,
            &progress_path,
            &ResolverConfig::default(),
            &AtomicBool::new(false),
        )
        .await
        .unwrap();

        assert_eq!(stats.updated, 2);
        assert_eq!(stats.attempted(), 2);
        assert_eq!(progress.last_index, 2);
        let saved = Progress::load_or_default(&progress_path).unwrap();
        assert_eq!(saved, progress);
        match &saved.processed[&pin("560001")] {
            ProgressEntry::Updated { old, new, source } => {
                assert_eq!(*old, Some(Coordinate { lat: 12.9716, lng: 77.5946 }));
                assert_eq!(*new, Coordinate { lat: 12.93, lng: 77.62 });
                assert_eq!(source, "mock");
            }
            other => panic!("unexpected entry {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_resume_skips_processed_and_failed() {
        let dir = tempdir().unwrap();
        let progress_path = dir.path().join("fetch_progress.json");
        let (chain, calls) = chain_with(None);
        let pincodes = vec![pin("560001"), pin("560002"), pin("560003")];

        let mut progress = Progress::default();
        progress
            .processed
            .insert(pin("560002"), ProgressEntry::unchanged());
        progress.record_failed(pin("560001"));

        let stats = resolve_pending(
            &chain,
            &pincodes,
            &store(),
            &mut progress,
            &progress_path,
            &ResolverConfig::default(),
            &AtomicBool::new(false),
        )
        .await
        .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(stats.skipped, 2);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.attempted(), 1);
        assert_eq!(progress.updated_count(), 0);
        assert_eq!(progress.failed, vec![pin("560001"), pin("560003")]);
        assert_eq!(progress.last_index, 3);
    }

    #[tokio::test]
    async fn test_shutdown_saves_and_stops() {
        let dir = tempdir().unwrap();
        let progress_path = dir.path().join("fetch_progress.json");
        let (chain, calls) = chain_with(None);
        let mut progress = Progress::default();

        let stats = resolve_pending(
            &chain,
            &[pin("560001")],
            &store(),
            &mut progress,
            &progress_path,
            &ResolverConfig::default(),
            &AtomicBool::new(true),
        )
        .await
        .unwrap();

        assert!(stats.interrupted);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(progress_path.exists());
        assert_eq!(progress.last_index, 0);
    }
}
