// Static heatmap raster: the matrix painted edge to edge with no axes.
//
// The picture is a one-inch figure saved at `max_number` DPI, i.e. a
// `max_number` pixel square, so the (N+1)-cell matrix is resampled by
// nearest neighbour. Row 0 is the top row of pixels.

use std::path::Path;

use anyhow::{Context, Result};
use image::{ImageFormat, Rgba, RgbaImage};
use ndarray::Array2;
use tracing::debug;

use super::palette::{inferno_256, ColorScale};

/// Fully transparent pixel used for NaN cells.
const NAN_PIXEL: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Paint `matrix` into a `size` x `size` image.
pub fn render_heatmap(matrix: &Array2<f64>, size: u32) -> RgbaImage {
    let size = size.max(1);
    let palette = inferno_256();
    let scale = ColorScale::for_matrix(matrix);
    let (rows, cols) = matrix.dim();

    RgbaImage::from_fn(size, size, |px, py| {
        let row = sample_cell(py, size, rows);
        let col = sample_cell(px, size, cols);
        match scale.index(matrix[[row, col]]) {
            Some(i) => {
                let [r, g, b] = palette[i];
                Rgba([r, g, b, 255])
            }
            None => NAN_PIXEL,
        }
    })
}

/// Cell whose span contains the centre of pixel `p`.
fn sample_cell(p: u32, size: u32, cells: usize) -> usize {
    let centre = (p as f64 + 0.5) / size as f64;
    ((centre * cells as f64) as usize).min(cells.saturating_sub(1))
}

/// Render and save the heatmap as a PNG.
pub fn write_png(matrix: &Array2<f64>, max_number: usize, path: &Path) -> Result<()> {
    let size = u32::try_from(max_number).context("max-number too large for an image")?;
    let img = render_heatmap(matrix, size);
    img.save_with_format(path, ImageFormat::Png)
        .with_context(|| format!("Failed to write image {}", path.display()))?;
    debug!(path = %path.display(), size = img.width(), "Wrote heatmap image");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_sample_cell_covers_all_cells() {
        // 11 cells drawn into 10 pixels: first and last pixels hit the edges.
        assert_eq!(sample_cell(0, 10, 11), 0);
        assert_eq!(sample_cell(9, 10, 11), 10);
        // Upsampling repeats cells.
        assert_eq!(sample_cell(0, 4, 2), 0);
        assert_eq!(sample_cell(1, 4, 2), 0);
        assert_eq!(sample_cell(2, 4, 2), 1);
    }

    #[test]
    fn test_render_dimensions() {
        let m = array![[1.0, 0.2], [0.2, 1.0]];
        let img = render_heatmap(&m, 7);
        assert_eq!(img.dimensions(), (7, 7));
    }

    #[test]
    fn test_nan_cells_are_transparent() {
        let m = array![[1.0, f64::NAN], [f64::NAN, f64::NAN]];
        let img = render_heatmap(&m, 2);
        assert_eq!(img.get_pixel(0, 0)[3], 255);
        assert_eq!(*img.get_pixel(1, 0), NAN_PIXEL);
        assert_eq!(*img.get_pixel(1, 1), NAN_PIXEL);
    }

    #[test]
    fn test_high_values_are_brightest() {
        let m = array![[1.0, -0.5], [-0.5, 1.0]];
        let img = render_heatmap(&m, 2);
        let palette = inferno_256();
        let [r, g, b] = palette[255];
        assert_eq!(*img.get_pixel(0, 0), Rgba([r, g, b, 255]));
        let [r, g, b] = palette[0];
        assert_eq!(*img.get_pixel(1, 0), Rgba([r, g, b, 255]));
    }
}
