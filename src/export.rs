//! CSV export of stored runs.
//!
//! One file per run. The first line is a `# K = <K>` comment, followed by a
//! column header and one row per time step. A single trajectory gets the
//! columns `I,theta`; batches get `I_1,theta_1,I_2,theta_2,...`.
//!
//! Existing files are never overwritten: when `K-<K>-len-<n>.csv` is taken the
//! stem gets a ` (1)`, ` (2)`, ... suffix.

use crate::core::query::{Selector, Span};
use crate::core::run::{RunHistory, RunRecord};
use crate::core::state::{ACTION, ANGLE};
use crate::error::Result;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Default output directory, relative to the working directory.
pub const DEFAULT_EXPORT_DIR: &str = "results/csvs";

/// Where and under which name runs are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOptions {
    /// Output directory; created if missing.
    pub dir: PathBuf,
    /// File stem (may contain subdirectories) replacing the `K-<K>-len-<n>` default.
    pub name: Option<String>,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_EXPORT_DIR),
            name: None,
        }
    }
}

impl ExportOptions {
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Write the selected runs (all runs when `selection` is `None`) and return the paths in run order.
///
/// Errors: `Error::OutOfRange` for an invalid index selection, I/O and CSV errors otherwise.
/// Selection is validated before any file is created.
pub fn write_runs(
    history: &RunHistory,
    selection: Option<Span<usize>>,
    options: &ExportOptions,
) -> Result<Vec<PathBuf>> {
    let positions: Vec<usize> = match selection {
        None => (0..history.len()).collect(),
        Some(span) => history.select(&Selector::Run(span))?,
    };
    positions
        .into_iter()
        .map(|p| {
            let record = history.get(p + 1)?;
            write_run(record, options)
        })
        .collect()
}

/// Write a single run to a fresh file.
pub fn write_run(record: &RunRecord, options: &ExportOptions) -> Result<PathBuf> {
    let stem = match options.name.as_deref() {
        Some(name) => name.strip_suffix(".csv").unwrap_or(name).to_string(),
        None => default_stem(record),
    };
    let (path, mut file) = create_unique(&options.dir, &stem)?;

    writeln!(file, "# K = {:?}", record.k())?;
    let mut wtr = csv::Writer::from_writer(file);
    wtr.write_record(column_names(record.n_sim()))?;

    let view = record.trajectory().view();
    for step in 0..record.n_iters() {
        let row = (0..record.n_sim()).flat_map(|sim| {
            [
                view[[sim, ACTION, step]].to_string(),
                view[[sim, ANGLE, step]].to_string(),
            ]
        });
        wtr.write_record(row)?;
    }
    wtr.flush()?;

    info!(path = %path.display(), k = record.k(), n_iters = record.n_iters(), "wrote run");
    Ok(path)
}

/// `K-<K>-len-<n_iters>`, e.g. `K-1.0-len-500`.
pub fn default_stem(record: &RunRecord) -> String {
    format!("K-{:?}-len-{}", record.k(), record.n_iters())
}

fn column_names(n_sim: usize) -> Vec<String> {
    if n_sim == 1 {
        return vec!["I".to_string(), "theta".to_string()];
    }
    (1..=n_sim)
        .flat_map(|s| [format!("I_{s}"), format!("theta_{s}")])
        .collect()
}

/// Open `<dir>/<stem>.csv` with create-new semantics, bumping a ` (n)` suffix on collisions.
fn create_unique(dir: &Path, stem: &str) -> Result<(PathBuf, File)> {
    let base = dir.join(stem);
    if let Some(parent) = base.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut attempt = 0usize;
    loop {
        let candidate = if attempt == 0 {
            format!("{stem}.csv")
        } else {
            format!("{stem} ({attempt}).csv")
        };
        let path = dir.join(candidate);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => {
                if attempt > 0 {
                    warn!(path = %path.display(), "file name taken, wrote with suffix");
                }
                return Ok((path, file));
            }
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => attempt += 1,
            Err(e) => return Err(e.into()),
        }
    }
}
