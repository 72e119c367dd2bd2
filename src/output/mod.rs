// Output sinks: every artifact derived from the similarity matrix.
//
// Each sink reads the matrix and writes one artifact. File names are
// derived from max_number alone.

pub mod display;
pub mod heatmap;
pub mod palette;
pub mod raster;
pub mod terminal;
pub mod upper;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// `similarities-{N}.png`
pub fn image_file(dir: &Path, max_number: usize) -> PathBuf {
    dir.join(format!("similarities-{max_number}.png"))
}

/// `similarities-{N}.html`
pub fn html_file(dir: &Path, max_number: usize) -> PathBuf {
    dir.join(format!("similarities-{max_number}.html"))
}

/// `similarities-{N}.js` and `similarities-{N}-div.html`
pub fn component_files(dir: &Path, max_number: usize) -> (PathBuf, PathBuf) {
    (
        dir.join(format!("similarities-{max_number}.js")),
        dir.join(format!("similarities-{max_number}-div.html")),
    )
}

/// `upper-uint8-{N}.dta`
pub fn upper_file(dir: &Path, max_number: usize) -> PathBuf {
    dir.join(format!("upper-uint8-{max_number}.dta"))
}

/// Write a whole text file, creating or truncating it.
pub fn write_text(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_names_follow_max_number() {
        let dir = Path::new(".");
        assert_eq!(image_file(dir, 10), PathBuf::from("./similarities-10.png"));
        assert_eq!(html_file(dir, 10), PathBuf::from("./similarities-10.html"));
        assert_eq!(
            component_files(dir, 10),
            (
                PathBuf::from("./similarities-10.js"),
                PathBuf::from("./similarities-10-div.html")
            )
        );
        assert_eq!(upper_file(dir, 2100), PathBuf::from("./upper-uint8-2100.dta"));
    }
}
