use tracing::{debug, warn};

use crate::models::{Chunk, Sentence};

/// Default sentence terminator (CJK full stop)
pub const DEFAULT_TERMINATOR: char = '。';

/// Default chunk limit in characters
pub const DEFAULT_MAX_CHUNK_CHARS: usize = 1000;

/// Configuration for Stage 0 segmentation
#[derive(Debug, Clone)]
pub struct SegmentConfig {
    /// Maximum characters per chunk (a single longer sentence still gets its own chunk)
    pub max_chunk_chars: usize,
    /// Characters that end a sentence
    pub terminators: Vec<char>,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            max_chunk_chars: DEFAULT_MAX_CHUNK_CHARS,
            terminators: vec![DEFAULT_TERMINATOR],
        }
    }
}

/// Result of Stage 0 segmentation
#[derive(Debug)]
pub struct SegmentResult<'a> {
    /// Chunks in source order
    pub chunks: Vec<Chunk<'a>>,
    /// Number of sentences across all chunks
    pub sentence_count: usize,
    /// Number of chunks holding a single sentence longer than the limit
    pub oversized_chunks: usize,
}

/// Splits text into sentences on a set of terminator characters
#[derive(Debug, Clone)]
pub struct SentenceSegmenter {
    terminators: Vec<char>,
}

impl SentenceSegmenter {
    pub fn new(terminators: Vec<char>) -> Self {
        Self { terminators }
    }

    /// Lazily iterate the sentences of `text`
    ///
    /// Each sentence keeps its terminator and is trimmed of surrounding
    /// whitespace. A trailing fragment without a terminator is yielded as-is.
    /// Cloning the iterator restarts from the same position.
    pub fn sentences<'a, 't>(&'t self, text: &'a str) -> Sentences<'a, 't> {
        Sentences {
            rest: text,
            terminators: &self.terminators,
        }
    }
}

impl Default for SentenceSegmenter {
    fn default() -> Self {
        Self::new(vec![DEFAULT_TERMINATOR])
    }
}

/// Iterator over the sentences of a text
#[derive(Debug, Clone)]
pub struct Sentences<'a, 't> {
    rest: &'a str,
    terminators: &'t [char],
}

impl<'a> Iterator for Sentences<'a, '_> {
    type Item = Sentence<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let terminators = self.terminators;

        while !self.rest.is_empty() {
            let end = self
                .rest
                .char_indices()
                .find(|(_, c)| terminators.contains(c))
                .map(|(i, c)| i + c.len_utf8())
                .unwrap_or(self.rest.len());

            let (piece, rest) = self.rest.split_at(end);
            self.rest = rest;

            let piece = piece.trim();
            if !piece.is_empty() {
                return Some(Sentence::new(piece));
            }
        }

        None
    }
}

/// Greedily pack sentences into chunks of at most `max_chars` characters
///
/// A chunk is closed when the next sentence would push it over the limit.
/// Sentences are never split, so one sentence longer than the limit becomes
/// its own oversized chunk.
pub fn build_chunks<'a>(
    sentences: impl IntoIterator<Item = Sentence<'a>>,
    max_chars: usize,
) -> Vec<Chunk<'a>> {
    let mut chunks = Vec::new();
    let mut current = Chunk::new(0);

    for sentence in sentences {
        if !current.is_empty() && current.char_len + sentence.char_len() > max_chars {
            let next = Chunk::new(current.index + 1);
            chunks.push(std::mem::replace(&mut current, next));
        }
        current.push(sentence);
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

/// Execute Stage 0: segment text into sentence-aligned chunks
pub fn execute_stage0<'a>(text: &'a str, config: &SegmentConfig) -> SegmentResult<'a> {
    let segmenter = SentenceSegmenter::new(config.terminators.clone());
    let chunks = build_chunks(segmenter.sentences(text), config.max_chunk_chars);

    let sentence_count = chunks.iter().map(|c| c.sentences.len()).sum();
    let oversized_chunks = chunks
        .iter()
        .filter(|c| c.is_oversized(config.max_chunk_chars))
        .count();

    if oversized_chunks > 0 {
        warn!(
            "{} chunk(s) exceed {} chars because a single sentence is longer than the limit",
            oversized_chunks, config.max_chunk_chars
        );
    }

    debug!(
        "Stage 0: {} sentences packed into {} chunks",
        sentence_count,
        chunks.len()
    );

    SegmentResult {
        chunks,
        sentence_count,
        oversized_chunks,
    }
}
