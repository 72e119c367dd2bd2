// Pretrained word vectors read from a GloVe or word2vec text file.
//
// Format: one `token v1 v2 ... vD` entry per line. word2vec files start
// with a `count dim` header, skipped when its dim matches line 2. Only the
// tokens a run asks for are kept in memory, so a 400k-word GloVe file
// costs one streaming pass rather than a full load.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use super::traits::TokenEmbedder;

/// Immutable token → vector lookup table.
pub struct WordTable {
    name: String,
    dimension: usize,
    vectors: HashMap<String, Vec<f64>>,
}

impl WordTable {
    /// Load the entries whose token is in `wanted`, skipping the rest.
    pub fn load_subset(path: &Path, wanted: &HashSet<String>) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open word vectors {}", path.display()))?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "word vectors".to_string());

        let table = Self::from_reader(name, BufReader::new(file), |token| {
            wanted.contains(token)
        })
        .with_context(|| format!("Failed to read word vectors {}", path.display()))?;

        debug!(
            path = %path.display(),
            entries = table.vectors.len(),
            dim = table.dimension,
            "Loaded word vector table"
        );
        Ok(table)
    }

    /// Parse a table from any buffered reader.
    ///
    /// The first data line fixes the dimension D. After that the last D
    /// fields of a line are the vector and everything before them is the
    /// token, so tokens containing spaces (as in glove.840B) survive.
    pub fn from_reader<R: BufRead>(
        name: impl Into<String>,
        reader: R,
        keep: impl Fn(&str) -> bool,
    ) -> Result<Self> {
        let mut builder = TableBuilder::default();
        // Line 1 when it looks like `count dim`; settled by line 2.
        let mut pending_header: Option<Vec<String>> = None;

        for (index, line) in reader.lines().enumerate() {
            let line_no = index + 1;
            let line = line.with_context(|| format!("I/O error at line {line_no}"))?;
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.is_empty() {
                continue;
            }

            if line_no == 1 && looks_like_word2vec_header(&fields) {
                pending_header = Some(fields.iter().map(|f| f.to_string()).collect());
                continue;
            }

            if let Some(first) = pending_header.take() {
                builder.settle_first_line(&first, fields.len(), &keep)?;
            }
            builder.push(line_no, &fields, &keep)?;
        }

        // A lone `a b` line is a one-dimensional entry, not an empty table.
        if let Some(first) = pending_header {
            let first: Vec<&str> = first.iter().map(String::as_str).collect();
            builder.push(1, &first, &keep)?;
        }

        if builder.joined > 0 {
            debug!(
                lines = builder.joined,
                "Joined multi-field tokens in word vector table"
            );
        }

        let Some(dimension) = builder.dimension else {
            anyhow::bail!("word vector table is empty");
        };

        Ok(Self {
            name: name.into(),
            dimension,
            vectors: builder.vectors,
        })
    }

    /// Look up a token's vector.
    pub fn get(&self, token: &str) -> Option<&[f64]> {
        self.vectors.get(token).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

/// `count dim`: exactly two non-negative integers.
fn looks_like_word2vec_header(fields: &[&str]) -> bool {
    fields.len() == 2 && fields.iter().all(|f| f.parse::<usize>().is_ok())
}

#[derive(Default)]
struct TableBuilder {
    dimension: Option<usize>,
    vectors: HashMap<String, Vec<f64>>,
    /// Lines whose token spanned more than one field.
    joined: usize,
}

impl TableBuilder {
    /// Line 1 was header-shaped. It is a header only when its `dim`
    /// matches the width of line 2; otherwise it is a one-dimensional entry.
    fn settle_first_line(
        &mut self,
        first: &[String],
        second_width: usize,
        keep: &impl Fn(&str) -> bool,
    ) -> Result<()> {
        let dim: usize = first[1].parse()?;
        if second_width == dim + 1 {
            self.dimension = Some(dim);
            return Ok(());
        }
        let fields: Vec<&str> = first.iter().map(String::as_str).collect();
        self.push(1, &fields, keep)
    }

    fn push(&mut self, line_no: usize, fields: &[&str], keep: &impl Fn(&str) -> bool) -> Result<()> {
        let dim = match self.dimension {
            Some(d) => d,
            None => {
                if fields.len() < 2 {
                    anyhow::bail!("line {line_no}: token {:?} has no vector", fields[0]);
                }
                let d = fields.len() - 1;
                self.dimension = Some(d);
                d
            }
        };

        if fields.len() < dim + 1 {
            anyhow::bail!(
                "line {line_no}: expected {dim} components for {:?}, found {}",
                fields[0],
                fields.len() - 1
            );
        }

        let split = fields.len() - dim;
        let token = if split == 1 {
            fields[0].to_string()
        } else {
            self.joined += 1;
            fields[..split].join(" ")
        };

        if !keep(token.as_str()) {
            return Ok(());
        }

        let vector = fields[split..]
            .iter()
            .map(|v| v.parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("line {line_no}: bad number in vector for {token:?}"))?;
        self.vectors.insert(token, vector);
        Ok(())
    }
}

impl TokenEmbedder for WordTable {
    fn name(&self) -> &str {
        &self.name
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn embed(&self, tokens: &[String]) -> Result<Vec<Vec<f64>>> {
        let mut misses = 0usize;
        let vectors = tokens
            .iter()
            .map(|t| match self.get(t) {
                Some(v) => v.to_vec(),
                None => {
                    misses += 1;
                    vec![0.0; self.dimension]
                }
            })
            .collect();

        if misses > 0 {
            warn!(
                misses = misses,
                total = tokens.len(),
                "Tokens missing from word vector table, using zero vectors"
            );
        }
        Ok(vectors)
    }
}
