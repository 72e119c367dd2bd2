// Compact upper-triangle export for web viewers.
//
// Layout: the strict upper triangle (the diagonal is always 1 and is
// omitted), row-major, one byte per entry. Row r contributes the entries
// for columns r+1..n, so it starts at offset r*(n-1) - r*(r-1)/2.
// Bytes encode round(clamp(v, 0, 1) * 255); NaN encodes as 0.

use std::path::Path;

use anyhow::{Context, Result};
use ndarray::Array2;

/// Quantized strict upper triangle of an n x n similarity matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct UpperTriangle {
    size: usize,
    bytes: Vec<u8>,
}

impl UpperTriangle {
    pub fn encode(matrix: &Array2<f64>) -> Self {
        let n = matrix.nrows();
        let mut bytes = Vec::with_capacity(n * n.saturating_sub(1) / 2);
        for row in 0..n {
            for col in row + 1..n {
                bytes.push(quantize(matrix[[row, col]]));
            }
        }
        Self { size: n, bytes }
    }

    /// Rebuild from raw bytes for an n x n matrix.
    pub fn from_bytes(size: usize, bytes: Vec<u8>) -> Result<Self> {
        let expected = size * size.saturating_sub(1) / 2;
        if bytes.len() != expected {
            anyhow::bail!(
                "upper triangle for size {size} needs {expected} bytes, got {}",
                bytes.len()
            );
        }
        Ok(Self { size, bytes })
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Decoded similarity at (row, col), rounded to two decimals.
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row >= self.size || col >= self.size {
            return None;
        }
        if row == col {
            return Some(1.0);
        }
        let (row, col) = if col > row { (row, col) } else { (col, row) };
        let idx = self.row_offset(row) + col - row - 1;
        let byte = self.bytes[idx] as f64;
        Some((byte * 100.0 / 255.0).round() / 100.0)
    }

    fn row_offset(&self, row: usize) -> usize {
        row * (self.size - 1) - row * row.saturating_sub(1) / 2
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        std::fs::write(path, &self.bytes)
            .with_context(|| format!("Failed to write {}", path.display()))
    }
}

fn quantize(value: f64) -> u8 {
    if value.is_nan() {
        return 0;
    }
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_layout_is_row_major_upper() {
        let m = array![
            [1.0, 0.0, 1.0, 0.5],
            [0.0, 1.0, 0.2, 0.4],
            [1.0, 0.2, 1.0, f64::NAN],
            [0.5, 0.4, f64::NAN, 1.0],
        ];
        let upper = UpperTriangle::encode(&m);
        assert_eq!(upper.as_bytes(), &[0, 255, 128, 51, 102, 0]);
    }

    #[test]
    fn test_get_is_symmetric_with_unit_diagonal() {
        let m = array![[1.0, 0.25, 0.75], [0.25, 1.0, 0.5], [0.75, 0.5, 1.0]];
        let upper = UpperTriangle::encode(&m);
        assert_eq!(upper.get(1, 1), Some(1.0));
        assert_eq!(upper.get(0, 2), Some(0.75));
        assert_eq!(upper.get(2, 0), Some(0.75));
        assert_eq!(upper.get(1, 2), Some(0.5));
        assert_eq!(upper.get(3, 0), None);
    }

    #[test]
    fn test_negative_values_clamp_to_zero() {
        let m = array![[1.0, -0.8], [-0.8, 1.0]];
        let upper = UpperTriangle::encode(&m);
        assert_eq!(upper.get(0, 1), Some(0.0));
    }

    #[test]
    fn test_single_cell_is_empty() {
        let upper = UpperTriangle::encode(&array![[1.0]]);
        assert!(upper.as_bytes().is_empty());
        assert_eq!(upper.get(0, 0), Some(1.0));
    }

    #[test]
    fn test_from_bytes_checks_length() {
        assert!(UpperTriangle::from_bytes(3, vec![0; 3]).is_ok());
        assert!(UpperTriangle::from_bytes(3, vec![0; 4]).is_err());
    }
}
