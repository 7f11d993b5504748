use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Union of every speaker name seen in a run, narrator included
pub type CharacterSet = BTreeSet<String>;

/// A dialogue entry as returned by the extractor for one chunk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawDialogueEntry {
    /// Chunk-scoped sequence number; never carried into the merged result
    #[serde(alias = "id")]
    pub local_id: i64,
    pub speaker: String,
    pub content: String,
}

/// Structured extractor result for one chunk
///
/// Unknown keys (e.g. a model-supplied `character_dialogues`) are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkAnalysis {
    pub characters: Vec<String>,
    pub dialogues: Vec<RawDialogueEntry>,
}

/// A merged dialogue entry carrying its run-wide reading-order id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueEntry {
    #[serde(rename = "id")]
    pub global_id: u64,
    pub speaker: String,
    pub content: String,
}

/// One line of a speaker's transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeakerLine {
    #[serde(rename = "id")]
    pub global_id: u64,
    pub content: String,
}

impl From<&DialogueEntry> for SpeakerLine {
    fn from(entry: &DialogueEntry) -> Self {
        Self {
            global_id: entry.global_id,
            content: entry.content.clone(),
        }
    }
}

/// Complete output of an analysis run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub characters: CharacterSet,
    pub dialogues: Vec<DialogueEntry>,
    /// Speaker -> lines in ascending global id order
    pub character_dialogues: BTreeMap<String, Vec<SpeakerLine>>,
}

impl AnalysisResult {
    pub fn dialogue_count(&self) -> usize {
        self.dialogues.len()
    }

    pub fn lines_for(&self, speaker: &str) -> &[SpeakerLine] {
        self.character_dialogues
            .get(speaker)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}
