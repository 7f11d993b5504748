use tracing::info;

use crate::error::Result;
use crate::llm::DialogueExtractor;
use crate::models::AnalysisResult;
use crate::stages::{
    SegmentConfig, Stage1Config, execute_stage0, execute_stage1, execute_stage3,
};

/// Options for a full analysis run
#[derive(Debug, Clone, Default)]
pub struct AnalysisConfig {
    pub segment: SegmentConfig,
    pub extract: Stage1Config,
}

/// Analysis result plus what it took to produce it
#[derive(Debug)]
pub struct AnalysisRun {
    pub result: AnalysisResult,
    pub chunk_count: usize,
    pub sentence_count: usize,
}

/// Segment, extract, merge and group a narrative text
///
/// Any chunk failure aborts the run; nothing from earlier chunks is returned.
pub async fn analyze_text<E>(
    extractor: &E,
    text: &str,
    config: &AnalysisConfig,
) -> Result<AnalysisRun>
where
    E: DialogueExtractor + ?Sized,
{
    let segments = execute_stage0(text, &config.segment);
    info!(
        "Stage 0: {} sentences in {} chunks (max {} chars)",
        segments.sentence_count,
        segments.chunks.len(),
        config.segment.max_chunk_chars
    );

    let merger = execute_stage1(extractor, &segments.chunks, &config.extract).await?;
    let merged = merger.finish();
    info!(
        "Stage 2: {} dialogues from {} chunks",
        merged.dialogues.len(),
        merged.chunks_merged()
    );

    let result = execute_stage3(merged)?;

    Ok(AnalysisRun {
        result,
        chunk_count: segments.chunks.len(),
        sentence_count: segments.sentence_count,
    })
}
