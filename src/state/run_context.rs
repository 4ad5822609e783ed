use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};

/// Timestamp layout used in output file names
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Base name shared by the exported files
const OUTPUT_STEM: &str = "ProdutosLeveros";

/// Per-run values threaded through the orchestrator and exporters
#[derive(Debug, Clone)]
pub struct RunContext {
    pub started_at: DateTime<Local>,
    pub timestamp: String,
    pub headless: bool,
    pub output_dir: PathBuf,
    pub diagnostics_dir: PathBuf,
}

impl RunContext {
    /// Creates a context stamped with the current local time
    pub fn new(
        headless: bool,
        output_dir: impl Into<PathBuf>,
        diagnostics_dir: impl Into<PathBuf>,
    ) -> Self {
        Self::at(Local::now(), headless, output_dir, diagnostics_dir)
    }

    /// Creates a context for a fixed start time
    pub fn at(
        started_at: DateTime<Local>,
        headless: bool,
        output_dir: impl Into<PathBuf>,
        diagnostics_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            timestamp: started_at.format(TIMESTAMP_FORMAT).to_string(),
            started_at,
            headless,
            output_dir: output_dir.into(),
            diagnostics_dir: diagnostics_dir.into(),
        }
    }

    /// `ProdutosLeveros_<timestamp>.xlsx` in the output directory
    pub fn spreadsheet_path(&self) -> PathBuf {
        self.output_file("xlsx")
    }

    /// `ProdutosLeveros_<timestamp>.pdf` in the output directory
    pub fn document_path(&self) -> PathBuf {
        self.output_file("pdf")
    }

    /// Diagnostic screenshot location for a category whose cards could not be found
    pub fn screenshot_path(&self, category: &str) -> PathBuf {
        self.diagnostics_dir
            .join(format!("screenshot_categoria_{}_pagina.png", file_safe(category)))
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn output_file(&self, extension: &str) -> PathBuf {
        self.output_dir
            .join(format!("{}_{}.{}", OUTPUT_STEM, self.timestamp, extension))
    }
}

/// Replaces characters that are not valid in file names on common platforms
fn file_safe(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c => c,
        })
        .collect()
}
