use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::{info, warn};

use crate::io::{AnalysisReport, ReportMetadata, TranscriptWriter, WriteReport, WriterConfig};
use crate::models::AnalysisResult;

/// Configuration for Stage 4 rendering
#[derive(Debug, Clone, Default)]
pub struct Stage4Config {
    pub writer: WriterConfig,
}

/// Result of Stage 4 rendering
#[derive(Debug)]
pub struct Stage4Result {
    /// Per-speaker transcript files
    pub transcripts: WriteReport,
    /// Path to JSON report (if generated)
    pub report_path: Option<PathBuf>,
}

/// Execute Stage 4: Rendering
///
/// Produces two output views:
/// 1. One text transcript per character in `output_dir`
/// 2. Optionally, a JSON report of the whole analysis with run metadata
pub fn execute_stage4(
    result: &AnalysisResult,
    output_dir: &Path,
    report_output: Option<(&Path, ReportMetadata)>,
    config: &Stage4Config,
) -> Result<Stage4Result> {
    info!("Writing speaker transcripts to {:?}", output_dir);
    let writer = TranscriptWriter::new(output_dir, config.writer.clone());
    let transcripts = writer.write_all(result)?;

    if !transcripts.is_complete() {
        warn!(
            "{} of {} speaker files failed to write",
            transcripts.failures.len(),
            result.characters.len()
        );
    }

    let mut report_path = None;
    if let Some((path, metadata)) = report_output {
        info!("Writing JSON report to {:?}", path);
        AnalysisReport::new(result, metadata).write_json(path)?;
        report_path = Some(path.to_path_buf());
    }

    Ok(Stage4Result {
        transcripts,
        report_path,
    })
}
