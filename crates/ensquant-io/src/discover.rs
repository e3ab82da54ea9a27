use std::collections::HashSet;
use std::path::PathBuf;

use tracing::{info, warn};

use crate::{IoError, Result};

/// Expand case file patterns into concrete paths.
///
/// Patterns are expanded in declaration order, matches within a pattern in
/// lexical order. A path matched by several patterns is kept once, at its
/// first position, so no case is weighted twice.
pub fn expand_patterns<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<PathBuf>> {
    let mut seen = HashSet::new();
    let mut paths = Vec::new();

    for pattern in patterns {
        let pattern = pattern.as_ref();
        let entries = glob::glob(pattern).map_err(|source| IoError::Pattern {
            pattern: pattern.to_string(),
            source,
        })?;

        let mut matched = 0usize;
        for entry in entries {
            let path = entry.map_err(|e| {
                let path = e.path().to_path_buf();
                IoError::file(path, e.into())
            })?;
            matched += 1;
            if seen.insert(path.clone()) {
                paths.push(path);
            } else {
                warn!("{} matched more than once, loading it once", path.display());
            }
        }

        if matched == 0 {
            warn!("pattern `{pattern}` matched no case files");
        }
    }

    info!("{} case files from {} patterns", paths.len(), patterns.len());
    Ok(paths)
}
