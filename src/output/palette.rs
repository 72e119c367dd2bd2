// Inferno palette and the linear color mapper shared by every renderer.

use ndarray::Array2;

use crate::similarity::value_range;

/// Palette size, matching the 256-color Inferno ramp.
pub const PALETTE_SIZE: usize = 256;

/// The Inferno colormap sampled at 256 evenly spaced points.
pub fn inferno_256() -> Vec<[u8; 3]> {
    (0..PALETTE_SIZE)
        .map(|i| {
            let c = colorous::INFERNO.eval_rational(i, PALETTE_SIZE);
            [c.r, c.g, c.b]
        })
        .collect()
}

/// `#rrggbb` form of a palette entry.
pub fn hex(color: [u8; 3]) -> String {
    format!("#{:02x}{:02x}{:02x}", color[0], color[1], color[2])
}

/// Maps values in `[low, high]` linearly onto palette indices.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorScale {
    pub low: f64,
    pub high: f64,
}

impl ColorScale {
    /// Scale spanning the finite entries of `matrix`. A matrix with no
    /// finite entries gets the nominal cosine range.
    pub fn for_matrix(matrix: &Array2<f64>) -> Self {
        let (low, high) = value_range(matrix).unwrap_or((-1.0, 1.0));
        Self { low, high }
    }

    /// Palette index for `value`, or None for NaN.
    pub fn index(&self, value: f64) -> Option<usize> {
        if value.is_nan() {
            return None;
        }
        let span = self.high - self.low;
        if span <= 0.0 {
            return Some(0);
        }
        let scaled = ((value - self.low) / span * PALETTE_SIZE as f64).floor();
        Some(scaled.clamp(0.0, (PALETTE_SIZE - 1) as f64) as usize)
    }
}
