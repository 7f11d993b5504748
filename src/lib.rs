pub mod error;
pub mod io;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod stages;
pub mod tts;

pub use error::{DialogueError, ExtractError};
pub use io::{AnalysisReport, ReportMetadata, TranscriptWriter, WriterConfig, read_source_text};
pub use llm::{ChatClient, ChatConfig, DialogueExtractor, sanitize_response};
pub use models::{
    AnalysisResult, CharacterSet, Chunk, ChunkAnalysis, DialogueEntry, RawDialogueEntry,
    Sentence, SpeakerLine,
};
pub use pipeline::{AnalysisConfig, AnalysisRun, analyze_text};
pub use stages::{
    SegmentConfig, SentenceSegmenter, SequenceMerger, Stage1Config, Stage4Config, build_chunks,
    execute_stage0, execute_stage2, execute_stage3, execute_stage4, group_by_speaker,
};
pub use tts::{TtsClient, TtsConfig};
