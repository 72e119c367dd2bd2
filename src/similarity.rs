// Cosine similarity between every pair of number embeddings.
//
// V is the (N+1) x D vector matrix. Similarities are V·Vᵀ divided
// element-wise by the outer product of the row norms. A zero-norm row
// divides 0 by 0 and yields NaN across its row and column; that is
// passed through, not repaired.

use anyhow::Result;
use ndarray::{Array1, Array2, Axis};

/// Decimal string forms of `0..=max_number`, in order.
pub fn number_tokens(max_number: usize) -> Vec<String> {
    (0..=max_number).map(|i| i.to_string()).collect()
}

/// Stack per-token vectors into an (rows x dim) matrix.
pub fn vector_matrix(rows: Vec<Vec<f64>>) -> Result<Array2<f64>> {
    let n = rows.len();
    let dim = rows.first().map(Vec::len).unwrap_or(0);

    let mut flat = Vec::with_capacity(n * dim);
    for (i, row) in rows.into_iter().enumerate() {
        if row.len() != dim {
            anyhow::bail!(
                "embedding {i} has {} components, expected {dim}",
                row.len()
            );
        }
        flat.extend(row);
    }

    Ok(Array2::from_shape_vec((n, dim), flat)?)
}

/// Euclidean norm of each row.
pub fn row_norms(vectors: &Array2<f64>) -> Array1<f64> {
    vectors.map_axis(Axis(1), |row| row.dot(&row).sqrt())
}

/// Pairwise cosine similarities of the rows of `vectors`.
///
/// The result is exactly symmetric (the upper triangle is mirrored onto
/// the lower) and finite entries are clamped to [-1, 1].
pub fn cosine_similarity_matrix(vectors: &Array2<f64>) -> Array2<f64> {
    let prod = vectors.dot(&vectors.t());
    let norms = row_norms(vectors);
    let norms_outer = norms
        .view()
        .insert_axis(Axis(1))
        .dot(&norms.view().insert_axis(Axis(0)));

    let mut similarities = prod / &norms_outer;

    let n = similarities.nrows();
    for i in 0..n {
        for j in i..n {
            let v = similarities[[i, j]];
            let v = if v.is_finite() { v.clamp(-1.0, 1.0) } else { v };
            similarities[[i, j]] = v;
            similarities[[j, i]] = v;
        }
    }

    similarities
}

/// Smallest and largest finite entries, or None if nothing is finite.
pub fn value_range(matrix: &Array2<f64>) -> Option<(f64, f64)> {
    matrix
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// Number of NaN entries.
pub fn nan_count(matrix: &Array2<f64>) -> usize {
    matrix.iter().filter(|v| v.is_nan()).count()
}
