use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::models::{AnalysisResult, SpeakerLine};

/// Configuration for per-speaker transcript files
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Text placed before the speaker name on the first line
    pub header_prefix: String,
    /// Second line of every file
    pub separator: String,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            header_prefix: "角色：".to_string(),
            separator: "=".repeat(30),
        }
    }
}

/// Outcome of writing all speaker files
#[derive(Debug, Default)]
pub struct WriteReport {
    /// Files written successfully
    pub written: Vec<PathBuf>,
    /// Speakers whose file could not be written, with the reason
    pub failures: Vec<(String, anyhow::Error)>,
}

impl WriteReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Writes one UTF-8 text file per speaker
pub struct TranscriptWriter {
    output_dir: PathBuf,
    config: WriterConfig,
}

impl TranscriptWriter {
    pub fn new(output_dir: impl Into<PathBuf>, config: WriterConfig) -> Self {
        Self {
            output_dir: output_dir.into(),
            config,
        }
    }

    /// Format a speaker's transcript: header, separator, then `[id] content` lines
    pub fn format(&self, speaker: &str, lines: &[SpeakerLine]) -> String {
        let mut output = String::new();
        output.push_str(&format!("{}{}\n", self.config.header_prefix, speaker));
        output.push_str(&format!("{}\n", self.config.separator));
        for line in lines {
            output.push_str(&format!("[{}] {}\n", line.global_id, line.content));
        }
        output
    }

    fn write_to(&self, path: &Path, speaker: &str, lines: &[SpeakerLine]) -> Result<()> {
        std::fs::write(path, self.format(speaker, lines))
            .with_context(|| format!("Failed to write file: {:?}", path))
    }

    /// Write every character's file; one failure does not stop the others
    ///
    /// Names that sanitize to the same file stem get a numbered suffix, so
    /// each character always has a file of its own.
    pub fn write_all(&self, result: &AnalysisResult) -> Result<WriteReport> {
        std::fs::create_dir_all(&self.output_dir)
            .with_context(|| format!("Failed to create directory: {:?}", self.output_dir))?;

        let mut report = WriteReport::default();
        let mut used_stems = HashSet::new();
        for speaker in &result.characters {
            let stem = unique_stem(safe_file_stem(speaker), &mut used_stems);
            let path = self.output_dir.join(format!("{}.txt", stem));
            let lines = result.lines_for(speaker);
            match self.write_to(&path, speaker, lines) {
                Ok(()) => {
                    let count = lines.len();
                    info!("Wrote {} lines for {} to {:?}", count, speaker, path);
                    report.written.push(path);
                }
                Err(e) => {
                    warn!("Failed to write transcript for {}: {:#}", speaker, e);
                    report.failures.push((speaker.clone(), e));
                }
            }
        }

        Ok(report)
    }
}

/// Replace characters that are unsafe in file names
fn safe_file_stem(name: &str) -> String {
    let stem: String = name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    match stem.as_str() {
        "" | "." | ".." => "_".to_string(),
        _ => stem,
    }
}

/// Claim `stem`, or the first free `stem (n)` when it is already taken
///
/// Stems compare case-insensitively so the result is also distinct on
/// case-insensitive filesystems.
fn unique_stem(stem: String, used: &mut HashSet<String>) -> String {
    if used.insert(stem.to_lowercase()) {
        return stem;
    }
    let mut n = 2;
    loop {
        let candidate = format!("{} ({})", stem, n);
        if used.insert(candidate.to_lowercase()) {
            return candidate;
        }
        n += 1;
    }
}

/// Metadata about an analysis run
#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    pub run_id: String,
    pub generated_at: DateTime<Utc>,
    pub model: String,
    pub chunk_count: usize,
    pub dialogue_count: usize,
    pub character_count: usize,
}

impl ReportMetadata {
    pub fn new(model: &str, chunk_count: usize, result: &AnalysisResult) -> Self {
        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            generated_at: Utc::now(),
            model: model.to_string(),
            chunk_count,
            dialogue_count: result.dialogues.len(),
            character_count: result.characters.len(),
        }
    }
}

/// Machine-readable report of a whole run
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport<'a> {
    #[serde(flatten)]
    pub result: &'a AnalysisResult,
    pub metadata: ReportMetadata,
}

impl<'a> AnalysisReport<'a> {
    pub fn new(result: &'a AnalysisResult, metadata: ReportMetadata) -> Self {
        Self { result, metadata }
    }

    /// Write to a JSON file
    pub fn write_json(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create file: {:?}", path))?;
        serde_json::to_writer_pretty(file, self).context("Failed to write JSON")?;
        Ok(())
    }
}
