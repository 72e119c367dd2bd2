// Live viewing session: write the interactive document somewhere temporary
// and hand it to the default browser.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use super::heatmap::Heatmap;

/// Path the interactive document is written to before opening.
pub fn session_path(dir: &Path, max_number: usize) -> PathBuf {
    dir.join(format!("similarities-{max_number}-interactive.html"))
}

/// Write `heatmap` as a standalone document under the system temp
/// directory and open it in the browser. Returns the written path.
pub fn show(heatmap: &Heatmap, max_number: usize) -> Result<PathBuf> {
    let path = session_path(&std::env::temp_dir(), max_number);
    super::write_text(&path, &heatmap.standalone_html())?;

    webbrowser::open(&path.to_string_lossy())
        .with_context(|| format!("Failed to open {} in a browser", path.display()))?;

    info!(path = %path.display(), "Opened interactive heatmap");
    Ok(path)
}
