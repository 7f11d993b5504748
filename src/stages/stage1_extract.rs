use futures::future;
use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{info, warn};

use crate::error::{DialogueError, Result};
use crate::llm::{DialogueExtractor, SYSTEM_PROMPT, sanitize_response};
use crate::models::{Chunk, ChunkAnalysis};
use crate::stages::SequenceMerger;

/// Configuration for Stage 1
#[derive(Debug, Clone)]
pub struct Stage1Config {
    /// Additional attempts per chunk after a transport, parse or schema failure
    pub max_retries: u32,
    /// Chunks whose extractor calls may be in flight at once
    pub concurrency: usize,
}

impl Default for Stage1Config {
    fn default() -> Self {
        Self {
            max_retries: 0,
            concurrency: 1,
        }
    }
}

/// Execute Stage 1: extract every chunk and fold results into a merger
///
/// Results enter the merger strictly in chunk order. With `concurrency > 1`
/// extractor calls overlap, but completed results are buffered until all
/// earlier chunks have been merged. The first failing chunk aborts the run.
pub async fn execute_stage1<E>(
    extractor: &E,
    chunks: &[Chunk<'_>],
    config: &Stage1Config,
) -> Result<SequenceMerger>
where
    E: DialogueExtractor + ?Sized,
{
    let total = chunks.len();
    info!(
        "Stage 1: Extracting {} chunks with {} (concurrency {})",
        total,
        extractor.model(),
        config.concurrency.max(1)
    );

    stream::iter(chunks)
        .map(move |chunk| async move {
            let text = chunk.text();
            let number = chunk.index + 1;
            info!("Chunk {}/{}: {} chars", number, total, chunk.char_len);
            extract_chunk(extractor, &text, config)
                .await
                .map_err(|source| DialogueError::ChunkFailed {
                    index: number,
                    total,
                    source: Box::new(source),
                })
        })
        .buffered(config.concurrency.max(1))
        .try_fold(SequenceMerger::new(), |merger, analysis| {
            future::ready(Ok(merger.absorb(analysis)))
        })
        .await
}

/// Extract and sanitize a single chunk, retrying retryable failures
pub async fn extract_chunk<E>(
    extractor: &E,
    chunk_text: &str,
    config: &Stage1Config,
) -> Result<ChunkAnalysis>
where
    E: DialogueExtractor + ?Sized,
{
    let mut attempt = 0;

    loop {
        let result = match extractor.extract(SYSTEM_PROMPT, chunk_text).await {
            Ok(raw) => sanitize_response(&raw),
            Err(e) => Err(DialogueError::from(e)),
        };

        match result {
            Ok(analysis) => {
                info!(
                    "{} dialogues, {} characters",
                    analysis.dialogues.len(),
                    analysis.characters.len()
                );
                return Ok(analysis);
            }
            Err(e) if e.is_retryable() && attempt < config.max_retries => {
                attempt += 1;
                warn!("Attempt failed: {}; retry {} of {}", e, attempt, config.max_retries);
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExtractError;
    use crate::llm::mock::MockExtractor;
    use crate::stages::{SegmentConfig, execute_stage0};

    const REPLY_A: &str = r#"```json
{"characters": ["A"], "dialogues": [
    {"id": 1, "speaker": "A", "content": "甲。"},
    {"id": 2, "speaker": "A", "content": "乙。"}
]}
```"#;
    const REPLY_B: &str = r#"{"characters": ["B"], "dialogues": [{"id": 1, "speaker": "B", "content": "丙。"}]}"#;

    fn two_chunks() -> SegmentConfig {
        SegmentConfig {
            max_chunk_chars: 4,
            ..Default::default()
        }
    }

    #[test]
    fn test_stage1_config_default() {
        let config = Stage1Config::default();
        assert_eq!(config.max_retries, 0);
        assert_eq!(config.concurrency, 1);
    }

    #[tokio::test]
    async fn test_chunks_merge_in_order() {
        let segments = execute_stage0("甲。乙。丙。", &two_chunks());
        assert_eq!(segments.chunks.len(), 2);

        let extractor = MockExtractor::replying(&[REPLY_A, REPLY_B]);
        let merged = execute_stage1(&extractor, &segments.chunks, &Stage1Config::default())
            .await
            .unwrap()
            .finish();

        let ids: Vec<u64> = merged.dialogues.iter().map(|d| d.global_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(merged.dialogues[2].speaker, "B");
        assert_eq!(extractor.prompts(), vec!["甲。乙。", "丙。"]);
    }

    #[tokio::test]
    async fn test_failure_names_chunk_and_stops() {
        let segments = execute_stage0("甲。乙。丙。丁。戊。", &two_chunks());
        assert_eq!(segments.chunks.len(), 3);

        let extractor = MockExtractor::new(vec![
            Ok(REPLY_A.to_string()),
            Ok("not json at all".to_string()),
            Ok(REPLY_B.to_string()),
        ]);
        let err = execute_stage1(&extractor, &segments.chunks, &Stage1Config::default())
            .await
            .unwrap_err();

        match err {
            DialogueError::ChunkFailed { index, total, source } => {
                assert_eq!(index, 2);
                assert_eq!(total, 3);
                assert!(matches!(*source, DialogueError::Parse(_)));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(extractor.call_count(), 2);
    }

    #[tokio::test]
    async fn test_transport_error_propagates() {
        let segments = execute_stage0("甲。", &SegmentConfig::default());
        let extractor = MockExtractor::new(vec![Err(ExtractError::Api {
            status_code: 500,
            message: "boom".to_string(),
        })]);

        let err = execute_stage1(&extractor, &segments.chunks, &Stage1Config::default())
            .await
            .unwrap_err();
        assert_eq!(err.chunk_index(), Some(1));
        assert!(err.to_string().contains("HTTP 500"));
    }

    #[tokio::test]
    async fn test_retry_recovers_from_bad_reply() {
        let extractor = MockExtractor::new(vec![
            Err(ExtractError::EmptyResponse),
            Ok("{\"characters\": []}".to_string()),
            Ok(REPLY_B.to_string()),
        ]);
        let config = Stage1Config {
            max_retries: 2,
            ..Default::default()
        };

        let analysis = extract_chunk(&extractor, "丙。", &config).await.unwrap();
        assert_eq!(analysis.dialogues.len(), 1);
        assert_eq!(extractor.call_count(), 3);
    }

    #[tokio::test]
    async fn test_no_retry_by_default() {
        let extractor = MockExtractor::new(vec![
            Err(ExtractError::EmptyResponse),
            Ok(REPLY_B.to_string()),
        ]);

        let err = extract_chunk(&extractor, "丙。", &Stage1Config::default())
            .await
            .unwrap_err();
        assert!(matches!(err, DialogueError::Transport(ExtractError::EmptyResponse)));
        assert_eq!(extractor.call_count(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_extraction_keeps_chunk_order() {
        let segments = execute_stage0("甲。乙。丙。丁。", &two_chunks());
        let texts: Vec<String> = segments.chunks.iter().map(|c| c.text()).collect();
        assert_eq!(texts, vec!["甲。乙。", "丙。丁。"]);

        let reply_second = r#"{"characters": ["B"], "dialogues": [
            {"id": 1, "speaker": "B", "content": "丙。"},
            {"id": 2, "speaker": "B", "content": "丁。"}
        ]}"#;
        let extractor = MockExtractor::keyed(&[("甲。乙。", REPLY_A), ("丙。丁。", reply_second)]);
        let config = Stage1Config {
            concurrency: 4,
            ..Default::default()
        };

        let merged = execute_stage1(&extractor, &segments.chunks, &config)
            .await
            .unwrap()
            .finish();

        let order: Vec<(u64, &str)> = merged
            .dialogues
            .iter()
            .map(|d| (d.global_id, d.content.as_str()))
            .collect();
        assert_eq!(order, vec![(1, "甲。"), (2, "乙。"), (3, "丙。"), (4, "丁。")]);
    }
}
