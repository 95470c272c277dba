//! Result files written by every provisioning command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Serialize)]
pub struct Failure {
  pub entry: Value,
  pub error: String,
}

/// Outcome of one pass over a list of desired remote objects.
#[derive(Debug, Default, Serialize)]
pub struct Report {
  pub created: Vec<Value>,
  pub skipped: Vec<Value>,
  pub failed:  Vec<Failure>,
}

impl Report {
  pub fn fail(&mut self, entry: Value, error: impl std::fmt::Display) {
    tracing::warn!(%error, "entry failed");
    self.failed.push(Failure { entry, error: error.to_string() });
  }

  /// Write the report to `out`. Failed entries are also written, bare, to
  /// the pending file next to it so they can be fed back in later.
  pub fn write(&self, out: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(self)?;
    std::fs::write(out, json).with_context(|| format!("writing {}", out.display()))?;

    if !self.failed.is_empty() {
      let pending_path = pending_path(out);
      let entries: Vec<&Value> = self.failed.iter().map(|f| &f.entry).collect();
      std::fs::write(&pending_path, serde_json::to_string_pretty(&entries)?)
        .with_context(|| format!("writing {}", pending_path.display()))?;
      tracing::warn!(count = entries.len(), path = %pending_path.display(), "failed entries saved for follow-up");
    }

    tracing::info!(
      created = self.created.len(),
      skipped = self.skipped.len(),
      failed = self.failed.len(),
      "done"
    );
    Ok(())
  }
}

/// `results.json` → `results.pending.json`.
pub fn pending_path(out: &Path) -> PathBuf {
  let stem = out.file_stem().and_then(|s| s.to_str()).unwrap_or("results");
  out.with_file_name(format!("{stem}.pending.json"))
}
