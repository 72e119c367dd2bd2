// The similarity pipeline: validate → load model → embed → similarities → outputs.
//
// A strict linear sequence. Each requested output reads the finished matrix
// independently; any failure aborts the remaining steps.

use std::path::PathBuf;

use anyhow::{Context, Result};
use ndarray::Array2;
use tracing::info;

use crate::embedding::traits::TokenEmbedder;
use crate::error::PipelineError;
use crate::output::{self, display, heatmap::Heatmap, raster, upper::UpperTriangle};
use crate::similarity::{
    cosine_similarity_matrix, nan_count, number_tokens, value_range, vector_matrix,
};

/// Which artifacts to produce. Each flag is independent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outputs {
    /// Open the interactive heatmap in a browser
    pub interact: bool,
    /// `similarities-{N}.png`
    pub image: bool,
    /// `similarities-{N}.html`
    pub html: bool,
    /// `similarities-{N}.js` + `similarities-{N}-div.html`
    pub components: bool,
    /// `upper-uint8-{N}.dta`
    pub upper: bool,
}

impl Outputs {
    fn needs_heatmap(&self) -> bool {
        self.interact || self.html || self.components
    }
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Unvalidated upper bound of the number range.
    pub max_number: i64,
    pub outputs: Outputs,
    /// Directory receiving every output file.
    pub output_dir: PathBuf,
}

/// What a run computed and wrote.
#[derive(Debug)]
pub struct RunReport {
    pub max_number: usize,
    pub model_name: String,
    pub matrix_size: usize,
    pub value_range: Option<(f64, f64)>,
    pub nan_entries: usize,
    /// Files written under the output directory, in the order written.
    pub files: Vec<PathBuf>,
    /// Document opened in the browser, if a session was launched.
    pub session: Option<PathBuf>,
    pub similarities: Array2<f64>,
}

/// Reject ranges that would contain fewer than two numbers.
pub fn validate_max_number(max_number: i64) -> Result<usize, PipelineError> {
    if max_number < 1 {
        return Err(PipelineError::InvalidArgument(format!(
            "max-number must be positive, got {max_number}"
        )));
    }
    usize::try_from(max_number)
        .map_err(|_| PipelineError::InvalidArgument(format!("max-number {max_number} is too large")))
}

/// Embed `0..=max_number` into the (N+1) x D vector matrix.
pub fn embed_numbers<E>(embedder: &E, max_number: usize) -> Result<Array2<f64>>
where
    E: TokenEmbedder + ?Sized,
{
    let tokens = number_tokens(max_number);
    let vectors = embedder
        .embed(&tokens)
        .with_context(|| format!("{} failed to embed numbers", embedder.name()))?;
    if vectors.len() != tokens.len() {
        anyhow::bail!(
            "{} returned {} vectors for {} tokens",
            embedder.name(),
            vectors.len(),
            tokens.len()
        );
    }

    vector_matrix(vectors)
}

/// Embed `0..=max_number` and compute the full similarity matrix.
pub fn compute_similarities<E>(embedder: &E, max_number: usize) -> Result<Array2<f64>>
where
    E: TokenEmbedder + ?Sized,
{
    let vectors = embed_numbers(embedder, max_number)?;
    Ok(cosine_similarity_matrix(&vectors))
}

/// Run the whole pipeline.
///
/// `load_embedder` receives the tokens that will be embedded and is only
/// called once `max_number` has been validated.
pub fn run<E, F>(options: &RunOptions, load_embedder: F) -> Result<RunReport>
where
    E: TokenEmbedder,
    F: FnOnce(&[String]) -> Result<E>,
{
    let max_number = validate_max_number(options.max_number)?;
    let outputs = &options.outputs;
    let dir = &options.output_dir;

    println!("Computing vectors");
    let embedder = load_embedder(&number_tokens(max_number))?;
    info!(
        model = embedder.name(),
        dim = embedder.dimension(),
        max_number = max_number,
        "Embedding model ready"
    );

    let vectors = embed_numbers(&embedder, max_number)?;

    println!("Computing similarities");
    let similarities = cosine_similarity_matrix(&vectors);

    let mut files = Vec::new();
    let mut session = None;

    if outputs.image {
        let path = output::image_file(dir, max_number);
        println!("Writing plot to {}", path.display());
        raster::write_png(&similarities, max_number, &path)?;
        files.push(path);
    }

    if outputs.upper {
        let path = output::upper_file(dir, max_number);
        println!("Writing upper-triangle data to {}", path.display());
        UpperTriangle::encode(&similarities).write(&path)?;
        files.push(path);
    }

    if outputs.needs_heatmap() {
        let heatmap = Heatmap::new(&similarities, max_number, embedder.name())?;

        if outputs.interact {
            println!("Launching browser demo");
            session = Some(display::show(&heatmap, max_number)?);
        }

        if outputs.html {
            let path = output::html_file(dir, max_number);
            println!("Writing standalone HTML document to {}", path.display());
            output::write_text(&path, &heatmap.standalone_html())?;
            files.push(path);
        }

        if outputs.components {
            let (js_path, div_path) = output::component_files(dir, max_number);
            println!(
                "Writing embedding components to {} and {}",
                js_path.display(),
                div_path.display()
            );
            let (script, div) = heatmap.components();
            output::write_text(&js_path, &script)?;
            output::write_text(&div_path, &div)?;
            files.push(js_path);
            files.push(div_path);
        }
    }

    println!("Done!");

    Ok(RunReport {
        max_number,
        model_name: embedder.name().to_string(),
        matrix_size: similarities.nrows(),
        value_range: value_range(&similarities),
        nan_entries: nan_count(&similarities),
        files,
        session,
        similarities,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_non_positive() {
        assert!(matches!(
            validate_max_number(0),
            Err(PipelineError::InvalidArgument(_))
        ));
        assert!(matches!(
            validate_max_number(-1),
            Err(PipelineError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_validate_accepts_positive() {
        assert_eq!(validate_max_number(1), Ok(1));
        assert_eq!(validate_max_number(256), Ok(256));
    }

    #[test]
    fn test_heatmap_only_built_when_needed() {
        assert!(!Outputs::default().needs_heatmap());
        let image_only = Outputs {
            image: true,
            ..Outputs::default()
        };
        assert!(!image_only.needs_heatmap());
        let html = Outputs {
            html: true,
            ..Outputs::default()
        };
        assert!(html.needs_heatmap());
    }
}
