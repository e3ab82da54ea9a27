use std::path::{Path, PathBuf};

use ensquant_core::{OutputTarget, DEFAULT_RESOLUTION};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{IoError, Result};

/// Everything after this marker on a line is a comment.
pub const COMMENT_MARKER: &str = "--";

/// Configuration as written, before validation.
///
/// Keyword files look like:
///
/// ```text
/// CASE_LIST   simulation*/run*/CASE*.parquet
/// NUM_INTERP  100
/// OUTPUT      FILE1   WWCT:OP_1:0.10  WWCT:OP_1:0.50
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub case_lists: Vec<Vec<String>>,
    #[serde(default)]
    pub num_interp: Option<usize>,
    #[serde(default)]
    pub outputs: Vec<OutputDecl>,
}

/// One `OUTPUT` line: destination file and its composite keys.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OutputDecl {
    pub file: String,
    #[serde(default)]
    pub keys: Vec<String>,
}

impl ConfigFile {
    /// Read a keyword file, or JSON when the extension is `.json`.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| IoError::file(path, e))?;
        if path.extension().is_some_and(|ext| ext == "json") {
            Ok(serde_json::from_str(&text)?)
        } else {
            Self::parse_keywords(&text, path)
        }
    }

    /// Parse the keyword grammar; `origin` only labels errors.
    pub fn parse_keywords(text: &str, origin: &Path) -> Result<Self> {
        let mut config = ConfigFile::default();

        for (number, raw) in text.lines().enumerate() {
            let line = number + 1;
            let content = match raw.find(COMMENT_MARKER) {
                Some(pos) => &raw[..pos],
                None => raw,
            };
            let mut tokens = content.split_whitespace();
            let Some(keyword) = tokens.next() else {
                continue;
            };
            let args: Vec<String> = tokens.map(str::to_string).collect();
            let error = |message: String| IoError::Config {
                path: origin.to_path_buf(),
                line,
                message,
            };

            match keyword {
                "CASE_LIST" => {
                    if args.is_empty() {
                        return Err(error("CASE_LIST needs at least one pattern".into()));
                    }
                    config.case_lists.push(args);
                }
                "NUM_INTERP" => {
                    if config.num_interp.is_some() {
                        return Err(error("NUM_INTERP given more than once".into()));
                    }
                    let [value] = args.as_slice() else {
                        return Err(error(format!(
                            "NUM_INTERP takes one argument, got {}",
                            args.len()
                        )));
                    };
                    let n = value
                        .parse()
                        .map_err(|_| error(format!("NUM_INTERP `{value}` is not an integer")))?;
                    config.num_interp = Some(n);
                }
                "OUTPUT" => {
                    let Some((file, keys)) = args.split_first() else {
                        return Err(error("OUTPUT needs a file name".into()));
                    };
                    config.outputs.push(OutputDecl {
                        file: file.clone(),
                        keys: keys.to_vec(),
                    });
                }
                other => return Err(error(format!("unknown keyword `{other}`"))),
            }
        }

        Ok(config)
    }
}

/// Validated run settings.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RunConfig {
    /// Case file glob patterns, in declaration order.
    pub case_patterns: Vec<String>,
    /// Number of grid points.
    pub resolution: usize,
    pub targets: Vec<OutputTarget>,
}

impl RunConfig {
    /// Load and validate `path`. `resolution` overrides `NUM_INTERP`.
    pub fn load(path: &Path, resolution: Option<usize>) -> Result<Self> {
        let file = ConfigFile::load(path)?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Self::from_file(file, base, resolution)
    }

    /// Validate a parsed file. Relative patterns and output files resolve
    /// against `base`.
    pub fn from_file(file: ConfigFile, base: &Path, resolution: Option<usize>) -> Result<Self> {
        let case_patterns: Vec<String> = file
            .case_lists
            .into_iter()
            .flatten()
            .map(|pattern| resolve(base, &pattern).to_string_lossy().into_owned())
            .collect();
        if case_patterns.is_empty() {
            return Err(IoError::Invalid("no CASE_LIST declared".into()));
        }

        let resolution = resolution.or(file.num_interp).unwrap_or(DEFAULT_RESOLUTION);
        if resolution < 2 {
            return Err(ensquant_core::Error::GridResolution(resolution).into());
        }

        // One table per destination; a later OUTPUT for the same file
        // replaces the earlier one.
        let mut targets: Vec<OutputTarget> = Vec::with_capacity(file.outputs.len());
        for decl in &file.outputs {
            let target = OutputTarget::parse(resolve(base, &decl.file), &decl.keys)?;
            match targets
                .iter_mut()
                .find(|t| t.destination == target.destination)
            {
                Some(existing) => {
                    warn!(
                        "OUTPUT {} declared more than once, using the last declaration",
                        target.destination.display()
                    );
                    *existing = target;
                }
                None => targets.push(target),
            }
        }

        Ok(Self {
            case_patterns,
            resolution,
            targets,
        })
    }
}

fn resolve(base: &Path, name: &str) -> PathBuf {
    let path = Path::new(name);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
