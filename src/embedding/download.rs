// Model download helper for the ONNX sentence embedder.
//
// Fetches all-MiniLM-L6-v2 (model + tokenizer) from HuggingFace into a
// platform-appropriate directory (~/.local/share/numsim/models/ on Linux)
// so it persists across runs.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

/// HuggingFace repo for the sentence embedding model.
const EMBEDDING_HF_URL: &str =
    "https://huggingface.co/sentence-transformers/all-MiniLM-L6-v2/resolve/main";

/// Subdirectory within the model dir holding the embedding model.
const EMBEDDING_SUBDIR: &str = "all-MiniLM-L6-v2";

/// A file to fetch: remote path under the repo, local name, whether it is
/// large enough to deserve a progress bar.
struct ModelFile {
    remote: &'static str,
    local: &'static str,
    large: bool,
}

const EMBEDDING_FILES: [ModelFile; 2] = [
    ModelFile {
        remote: "tokenizer.json",
        local: "tokenizer.json",
        large: false,
    },
    ModelFile {
        remote: "onnx/model.onnx",
        local: "model.onnx",
        large: true,
    },
];

/// Returns the default directory for storing model files.
pub fn default_model_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("numsim")
        .join("models")
}

/// Directory within `base` that holds the embedding model files.
pub fn embedding_model_dir(base: &Path) -> PathBuf {
    base.join(EMBEDDING_SUBDIR)
}

/// Check whether both required embedding model files exist.
pub fn embedding_files_present(base: &Path) -> bool {
    let dir = embedding_model_dir(base);
    EMBEDDING_FILES.iter().all(|f| dir.join(f.local).exists())
}

/// Download the embedding model. Skips files that already exist.
pub async fn download_model(base: &Path) -> Result<()> {
    let dir = embedding_model_dir(base);
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create model directory: {}", dir.display()))?;

    println!("\nSentence embedding model ({EMBEDDING_SUBDIR}):");

    for file in &EMBEDDING_FILES {
        let dest = dir.join(file.local);
        if dest.exists() {
            info!(file = file.local, "Model file already exists, skipping");
            println!("  {} (already exists)", file.local);
            continue;
        }

        if file.large {
            println!("  Downloading {} (~90 MB)...", file.local);
        } else {
            println!("  Downloading {}...", file.local);
        }
        download_file(
            &format!("{}/{}", EMBEDDING_HF_URL, file.remote),
            &dest,
            file.large,
        )
        .await?;
    }

    Ok(())
}

/// Download a single file from a URL to a local path.
/// If `show_progress` is true, display a progress bar.
async fn download_file(url: &str, dest: &Path, show_progress: bool) -> Result<()> {
    let client = reqwest::Client::new();
    let mut response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("Failed to download {}", url))?;

    if !response.status().is_success() {
        anyhow::bail!("Download failed with status {}: {}", response.status(), url);
    }

    let pb = if show_progress {
        Some(progress_bar(response.content_length()))
    } else {
        None
    };

    let mut body = Vec::new();
    while let Some(chunk) = response
        .chunk()
        .await
        .context("Failed to read response body")?
    {
        body.extend_from_slice(&chunk);
        if let Some(ref pb) = pb {
            pb.set_position(body.len() as u64);
        }
    }

    // A file under its final name is always complete.
    let partial = dest.with_extension("part");
    std::fs::write(&partial, &body)
        .with_context(|| format!("Failed to write {}", partial.display()))?;
    std::fs::rename(&partial, dest)
        .with_context(|| format!("Failed to move download into {}", dest.display()))?;

    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    info!("Downloaded {} to {}", url, dest.display());
    Ok(())
}

fn progress_bar(total_size: Option<u64>) -> ProgressBar {
    match total_size {
        Some(size) => {
            let pb = ProgressBar::new(size);
            pb.set_style(
                ProgressStyle::default_bar()
                    .template("    [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
                    .expect("valid template")
                    .progress_chars("=> "),
            );
            pb
        }
        None => {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("    {spinner} {bytes}")
                    .expect("valid template"),
            );
            pb
        }
    }
}
