//! Shared plumbing for the pincode batch commands
//!
//! Every command reads and writes fixed relative paths by default, so each
//! one runs from the project root with no flags.

use anyhow::Result;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;
use tracing_subscriber::prelude::*;

/// Default coordinate store
pub const DEFAULT_STORE: &str = "public/data/pincode_latlng.json";
pub const DEFAULT_REPORT: &str = "duplicate_coords_report.json";
pub const DEFAULT_FIX_LIST: &str = "pincodes_needing_unique_coords.txt";
pub const DEFAULT_PROGRESS: &str = "fetch_progress.json";
pub const DEFAULT_MISSING_LIST: &str = "missing_pincodes.txt";

/// Install the fmt subscriber. `RUST_LOG` wins when set; otherwise
/// `info`, or `debug` with `--verbose`.
pub fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default.into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

/// Section heading in the log
pub fn banner(title: &str) {
    info!("{}", "=".repeat(50));
    info!("{}", title);
    info!("{}", "=".repeat(50));
}

/// Write `items` one per line, no trailing newline
pub fn write_lines<I, S>(path: impl AsRef<Path>, items: I) -> Result<usize>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut writer = BufWriter::new(File::create(path.as_ref())?);
    let mut written = 0;
    for item in items {
        if written > 0 {
            writer.write_all(b"\n")?;
        }
        writer.write_all(item.as_ref().as_bytes())?;
        written += 1;
    }
    writer.flush()?;
    Ok(written)
}
