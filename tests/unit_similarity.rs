// Properties of the similarity matrix built from number embeddings.
//
// Uses a deterministic in-test embedder, so nothing here needs model files.

use approx::assert_abs_diff_eq;
use numsim::embedding::traits::TokenEmbedder;
use numsim::pipeline::compute_similarities;

/// Maps "i" to a smooth, never-zero 4-d vector.
struct WaveEmbedder;

impl TokenEmbedder for WaveEmbedder {
    fn name(&self) -> &str {
        "wave"
    }

    fn dimension(&self) -> usize {
        4
    }

    fn embed(&self, tokens: &[String]) -> anyhow::Result<Vec<Vec<f64>>> {
        Ok(tokens
            .iter()
            .map(|t| {
                let i: f64 = t.parse().unwrap();
                vec![1.0, (i * 0.3).sin(), (i * 0.7).cos(), i / 10.0]
            })
            .collect())
    }
}

/// Like WaveEmbedder but "3" is out of vocabulary and comes back as zeros.
struct HoleEmbedder;

impl TokenEmbedder for HoleEmbedder {
    fn name(&self) -> &str {
        "hole"
    }

    fn dimension(&self) -> usize {
        4
    }

    fn embed(&self, tokens: &[String]) -> anyhow::Result<Vec<Vec<f64>>> {
        let mut vectors = WaveEmbedder.embed(tokens)?;
        if let Some(i) = tokens.iter().position(|t| t == "3") {
            vectors[i] = vec![0.0; 4];
        }
        Ok(vectors)
    }
}

// ============================================================
// Shape
// ============================================================

#[test]
fn shape_is_max_number_plus_one_square() {
    for max in [1usize, 2, 10, 57] {
        let s = compute_similarities(&WaveEmbedder, max).unwrap();
        assert_eq!(s.dim(), (max + 1, max + 1), "max_number = {max}");
    }
}

#[test]
fn zero_max_number_gives_single_unit_cell() {
    let s = compute_similarities(&WaveEmbedder, 0).unwrap();
    assert_eq!(s.dim(), (1, 1));
    assert_abs_diff_eq!(s[[0, 0]], 1.0, epsilon = 1e-12);
}

// ============================================================
// Symmetry, diagonal, bounds
// ============================================================

#[test]
fn matrix_is_exactly_symmetric() {
    let s = compute_similarities(&WaveEmbedder, 40).unwrap();
    for i in 0..s.nrows() {
        for j in 0..s.ncols() {
            assert_eq!(s[[i, j]].to_bits(), s[[j, i]].to_bits(), "({i}, {j})");
        }
    }
}

#[test]
fn diagonal_is_one_for_nonzero_vectors() {
    let s = compute_similarities(&WaveEmbedder, 40).unwrap();
    for i in 0..s.nrows() {
        assert_abs_diff_eq!(s[[i, i]], 1.0, epsilon = 1e-12);
    }
}

#[test]
fn values_lie_in_unit_interval() {
    let s = compute_similarities(&WaveEmbedder, 40).unwrap();
    assert!(s.iter().all(|&v| (-1.0..=1.0).contains(&v)));
}

#[test]
fn matches_pairwise_cosine() {
    let s = compute_similarities(&WaveEmbedder, 12).unwrap();
    let tokens: Vec<String> = (0..=12).map(|i| i.to_string()).collect();
    let v = WaveEmbedder.embed(&tokens).unwrap();
    let cosine = |a: &[f64], b: &[f64]| {
        let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
        let na: f64 = a.iter().map(|x| x * x).sum::<f64>().sqrt();
        let nb: f64 = b.iter().map(|x| x * x).sum::<f64>().sqrt();
        dot / (na * nb)
    };
    assert_abs_diff_eq!(s[[2, 9]], cosine(&v[2], &v[9]), epsilon = 1e-12);
    assert_abs_diff_eq!(s[[11, 0]], cosine(&v[11], &v[0]), epsilon = 1e-12);
}

// ============================================================
// Zero-norm embeddings
// ============================================================

#[test]
fn zero_vector_poisons_only_its_row_and_column() {
    let s = compute_similarities(&HoleEmbedder, 6).unwrap();
    for k in 0..s.nrows() {
        assert!(s[[3, k]].is_nan(), "row 3, col {k}");
        assert!(s[[k, 3]].is_nan(), "row {k}, col 3");
    }
    for i in (0..s.nrows()).filter(|&i| i != 3) {
        for j in (0..s.ncols()).filter(|&j| j != 3) {
            assert!((-1.0..=1.0).contains(&s[[i, j]]), "({i}, {j})");
        }
    }
}

#[test]
fn mismatched_vector_count_is_an_error() {
    struct ShortEmbedder;
    impl TokenEmbedder for ShortEmbedder {
        fn name(&self) -> &str {
            "short"
        }
        fn dimension(&self) -> usize {
            1
        }
        fn embed(&self, _tokens: &[String]) -> anyhow::Result<Vec<Vec<f64>>> {
            Ok(vec![vec![1.0]])
        }
    }

    let err = compute_similarities(&ShortEmbedder, 3).unwrap_err();
    assert!(err.to_string().contains("1 vectors for 4 tokens"), "got: {err}");
}
