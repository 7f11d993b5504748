use tracing::debug;

use crate::models::{CharacterSet, ChunkAnalysis, DialogueEntry};

/// Running accumulator for the ordered fold over chunk results
///
/// Local ids from the extractor are discarded; every entry receives the next
/// global id in the order it is absorbed, starting at 1.
#[derive(Debug, Clone)]
pub struct SequenceMerger {
    next_id: u64,
    characters: CharacterSet,
    dialogues: Vec<DialogueEntry>,
    chunk_ends: Vec<u64>,
}

/// Result of Stage 2 merging
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedDialogue {
    pub characters: CharacterSet,
    /// Entries with global ids exactly 1..=N in reading order
    pub dialogues: Vec<DialogueEntry>,
    /// Per chunk in source order, one past the last global id it produced
    pub chunk_ends: Vec<u64>,
}

impl MergedDialogue {
    pub fn chunks_merged(&self) -> usize {
        self.chunk_ends.len()
    }

    /// 1-based source-order index of the chunk that produced `global_id`
    pub fn chunk_of(&self, global_id: u64) -> Option<usize> {
        let index = self.chunk_ends.partition_point(|&end| end <= global_id);
        (global_id >= 1 && index < self.chunk_ends.len()).then_some(index + 1)
    }
}

impl SequenceMerger {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            characters: CharacterSet::new(),
            dialogues: Vec::new(),
            chunk_ends: Vec::new(),
        }
    }

    /// Fold one chunk's result into the accumulator, in extractor order
    pub fn absorb(mut self, analysis: ChunkAnalysis) -> Self {
        let first_id = self.next_id;

        self.characters.extend(analysis.characters);
        for raw in analysis.dialogues {
            self.dialogues.push(DialogueEntry {
                global_id: self.next_id,
                speaker: raw.speaker,
                content: raw.content,
            });
            self.next_id += 1;
        }
        self.chunk_ends.push(self.next_id);

        debug!(
            "Merged chunk {}: ids {}..{}",
            self.chunk_ends.len(),
            first_id,
            self.next_id
        );

        self
    }

    pub fn finish(self) -> MergedDialogue {
        MergedDialogue {
            characters: self.characters,
            dialogues: self.dialogues,
            chunk_ends: self.chunk_ends,
        }
    }
}

impl Default for SequenceMerger {
    fn default() -> Self {
        Self::new()
    }
}

/// Execute Stage 2: merge chunk results, given in source order
pub fn execute_stage2(analyses: impl IntoIterator<Item = ChunkAnalysis>) -> MergedDialogue {
    analyses
        .into_iter()
        .fold(SequenceMerger::new(), SequenceMerger::absorb)
        .finish()
}
