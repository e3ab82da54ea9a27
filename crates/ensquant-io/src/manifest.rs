use std::path::{Path, PathBuf};

use ensquant_core::{Ensemble, OutputTarget, TimeSpan};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::output::TableSummary;
use crate::{IoError, Result};

/// Record of how one output table was produced.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub run_id: String,
    pub timestamp: String,
    pub output: PathBuf,
    pub cases: Vec<String>,
    pub resolution: usize,
    pub span: TimeSpan,
    pub keys: Vec<String>,
    pub rows: usize,
    pub missing_cells: usize,
}

impl RunManifest {
    pub fn new(run_id: &str, ensemble: &Ensemble, target: &OutputTarget, summary: &TableSummary) -> Self {
        Self {
            run_id: run_id.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            output: target.destination.clone(),
            cases: ensemble.cases().map(|case| case.id().to_string()).collect(),
            resolution: ensemble.grid().len(),
            span: ensemble.span(),
            keys: target.tokens().map(str::to_string).collect(),
            rows: summary.rows,
            missing_cells: summary.missing,
        }
    }

    /// Fresh identifier shared by the manifests of one run.
    pub fn new_run_id() -> String {
        Uuid::new_v4().to_string()
    }

    /// `<output>.manifest.json` next to the output table.
    pub fn path_for(output: &Path) -> PathBuf {
        let mut name = output.as_os_str().to_owned();
        name.push(".manifest.json");
        PathBuf::from(name)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|e| IoError::file(path, e))?;
        Ok(())
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| IoError::file(path, e))?;
        Ok(serde_json::from_str(&json)?)
    }
}
