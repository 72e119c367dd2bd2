use std::collections::HashSet;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use numsim::config::{Config, ModelBackend};
use numsim::embedding::traits::TokenEmbedder;
use numsim::pipeline::{Outputs, RunOptions, RunReport};

/// numsim: how similar do embedding models think numbers are?
///
/// Embeds the decimal strings of 0..=N, computes their pairwise cosine
/// similarities, and renders the matrix as a heatmap.
#[derive(Parser)]
#[command(name = "numsim", version, about, args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    run: RunArgs,
}

#[derive(Subcommand)]
enum Commands {
    /// Download the ONNX sentence embedding model (~90 MB)
    DownloadModel,
}

/// Each output flag comes as a `--x` / `--no-x` pair; the last one given wins.
#[derive(Args)]
struct RunArgs {
    /// Maximum number to plot
    #[arg(long, default_value_t = 256, allow_negative_numbers = true)]
    max_number: i64,

    /// Run an in-browser interactive plot (default)
    #[arg(long, overrides_with = "no_interact")]
    interact: bool,
    #[arg(long, overrides_with = "interact", hide = true)]
    no_interact: bool,

    /// Write a static PNG heatmap
    #[arg(long, overrides_with = "no_output_image")]
    output_image: bool,
    #[arg(long, overrides_with = "output_image", hide = true)]
    no_output_image: bool,

    /// Write a standalone HTML document
    #[arg(long, overrides_with = "no_output_html")]
    output_html: bool,
    #[arg(long, overrides_with = "output_html", hide = true)]
    no_output_html: bool,

    /// Write javascript and an HTML fragment for embedding
    #[arg(long, overrides_with = "no_output_components")]
    output_components: bool,
    #[arg(long, overrides_with = "output_components", hide = true)]
    no_output_components: bool,

    /// Write the quantized upper triangle for web viewers
    #[arg(long, overrides_with = "no_output_upper")]
    output_upper: bool,
    #[arg(long, overrides_with = "output_upper", hide = true)]
    no_output_upper: bool,
}

impl RunArgs {
    fn outputs(&self) -> Outputs {
        Outputs {
            interact: !self.no_interact,
            image: self.output_image,
            html: self.output_html,
            components: self.output_components,
            upper: self.output_upper,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("numsim=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::DownloadModel) => {
            let config = Config::load()?;
            println!("Downloading ONNX embedding model...");
            println!("  Destination: {}", config.model_dir.display());
            numsim::embedding::download::download_model(&config.model_dir).await?;
            println!("\n{}", "Model downloaded successfully.".bold());
            println!("You can now run `numsim --max-number 256`.");
        }
        None => {
            let report = run_pipeline(&cli.run, Config::load)?;
            numsim::output::terminal::display_summary(&report);
        }
    }

    Ok(())
}

/// Validate `--max-number` first, then load configuration and run.
/// A bad range is reported as such even when the environment is broken.
fn run_pipeline(args: &RunArgs, load_config: impl FnOnce() -> Result<Config>) -> Result<RunReport> {
    numsim::pipeline::validate_max_number(args.max_number)?;
    let config = load_config()?;

    let options = RunOptions {
        max_number: args.max_number,
        outputs: args.outputs(),
        output_dir: config.output_dir.clone(),
    };
    numsim::pipeline::run(&options, |tokens| load_embedder(&config, tokens))
}

/// Load the configured embedding model. Only called after validation.
fn load_embedder(config: &Config, tokens: &[String]) -> Result<Box<dyn TokenEmbedder>> {
    config.require_model()?;
    match config.model_backend {
        ModelBackend::Onnx => {
            info!("Using local ONNX sentence embedder");
            let dir = numsim::embedding::download::embedding_model_dir(&config.model_dir);
            let embedder = numsim::embedding::onnx::OnnxEmbedder::load(&dir)?;
            Ok(Box::new(embedder))
        }
        ModelBackend::Table => {
            let path = config
                .vectors_path
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("NUMSIM_VECTORS not set"))?;
            info!(path = %path.display(), "Using word vector table");
            let wanted: HashSet<String> = tokens.iter().cloned().collect();
            let table = numsim::embedding::table::WordTable::load_subset(path, &wanted)?;
            Ok(Box::new(table))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use numsim::error::PipelineError;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("numsim").chain(args.iter().copied()))
            .expect("arguments should parse")
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&[]);
        assert!(cli.command.is_none());
        assert_eq!(cli.run.max_number, 256);
        assert_eq!(
            cli.run.outputs(),
            Outputs {
                interact: true,
                image: false,
                html: false,
                components: false,
                upper: false,
            }
        );
    }

    #[test]
    fn test_no_interact_disables_session() {
        assert!(!parse(&["--no-interact"]).run.outputs().interact);
        assert!(parse(&["--interact"]).run.outputs().interact);
    }

    #[test]
    fn test_last_flag_of_a_pair_wins() {
        assert!(parse(&["--no-interact", "--interact"]).run.outputs().interact);
        assert!(!parse(&["--interact", "--no-interact"]).run.outputs().interact);
        assert!(!parse(&["--output-image", "--no-output-image"]).run.outputs().image);
        assert!(parse(&["--no-output-image", "--output-image"]).run.outputs().image);
        assert!(!parse(&["--output-html", "--no-output-html"]).run.outputs().html);
        assert!(
            !parse(&["--output-components", "--no-output-components"])
                .run
                .outputs()
                .components
        );
        assert!(parse(&["--no-output-upper", "--output-upper"]).run.outputs().upper);
    }

    #[test]
    fn test_output_flags_are_independent() {
        let outputs = parse(&["--no-interact", "--output-html", "--output-components"])
            .run
            .outputs();
        assert_eq!(
            outputs,
            Outputs {
                interact: false,
                image: false,
                html: true,
                components: true,
                upper: false,
            }
        );
    }

    #[test]
    fn test_negative_max_number_reaches_validation() {
        assert_eq!(parse(&["--max-number", "-1"]).run.max_number, -1);
        assert_eq!(parse(&["--max-number", "10"]).run.max_number, 10);
    }

    #[test]
    fn test_download_model_subcommand() {
        let cli = parse(&["download-model"]);
        assert!(matches!(cli.command, Some(Commands::DownloadModel)));
    }

    #[test]
    fn test_subcommand_rejects_run_flags() {
        let result = Cli::try_parse_from(["numsim", "--output-image", "download-model"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_max_number_reported_before_config() {
        let args = parse(&["--max-number", "-1"]);
        let err = run_pipeline(&args.run, || anyhow::bail!("Unknown NUMSIM_MODEL value"))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_config_error_surfaces_for_valid_range() {
        let args = parse(&["--max-number", "3", "--no-interact"]);
        let err = run_pipeline(&args.run, || anyhow::bail!("Unknown NUMSIM_MODEL value"))
            .unwrap_err();
        assert!(err.to_string().contains("NUMSIM_MODEL"));
    }
}
