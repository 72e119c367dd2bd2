// numsim: cosine similarity heatmaps of number embeddings
//
// This is the library root. The pipeline embeds the decimal strings of
// 0..=N, builds their pairwise cosine-similarity matrix, and renders it.

pub mod config;
pub mod embedding;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod similarity;
