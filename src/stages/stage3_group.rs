use std::collections::BTreeMap;

use tracing::info;

use crate::error::{DialogueError, Result};
use crate::models::{AnalysisResult, CharacterSet, DialogueEntry, SpeakerLine};
use crate::stages::MergedDialogue;

/// Group merged dialogue by speaker in one pass
///
/// Every character gets a list, possibly empty. Speakers match by exact
/// string. An entry whose speaker is not in `characters` is a consistency
/// error.
pub fn group_by_speaker(
    dialogues: &[DialogueEntry],
    characters: &CharacterSet,
) -> Result<BTreeMap<String, Vec<SpeakerLine>>> {
    let mut grouped: BTreeMap<String, Vec<SpeakerLine>> = characters
        .iter()
        .map(|name| (name.clone(), Vec::new()))
        .collect();

    for entry in dialogues {
        let lines = grouped
            .get_mut(&entry.speaker)
            .ok_or_else(|| DialogueError::Consistency {
                global_id: entry.global_id,
                speaker: entry.speaker.clone(),
            })?;
        lines.push(SpeakerLine::from(entry));
    }

    Ok(grouped)
}

/// Execute Stage 3: build the final analysis result
///
/// A consistency failure is reported against the chunk whose entry caused it.
pub fn execute_stage3(merged: MergedDialogue) -> Result<AnalysisResult> {
    let character_dialogues = group_by_speaker(&merged.dialogues, &merged.characters)
        .map_err(|e| {
            let index = match e {
                DialogueError::Consistency { global_id, .. } => merged.chunk_of(global_id),
                _ => None,
            };
            match index {
                Some(index) => DialogueError::ChunkFailed {
                    index,
                    total: merged.chunks_merged(),
                    source: Box::new(e),
                },
                None => e,
            }
        })?;

    info!(
        "Stage 3: {} dialogues grouped across {} characters",
        merged.dialogues.len(),
        merged.characters.len()
    );

    Ok(AnalysisResult {
        characters: merged.characters,
        dialogues: merged.dialogues,
        character_dialogues,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: u64, speaker: &str, content: &str) -> DialogueEntry {
        DialogueEntry {
            global_id: id,
            speaker: speaker.to_string(),
            content: content.to_string(),
        }
    }

    fn characters(names: &[&str]) -> CharacterSet {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_groups_preserve_global_order() {
        let dialogues = vec![
            entry(1, "旁白", "夜深了。"),
            entry(2, "他", "你好。"),
            entry(3, "旁白", "她抬起头。"),
            entry(4, "她", "你好。"),
            entry(5, "他", "再见。"),
        ];
        let grouped = group_by_speaker(&dialogues, &characters(&["旁白", "他", "她"])).unwrap();

        let ids = |speaker: &str| -> Vec<u64> {
            grouped[speaker].iter().map(|l| l.global_id).collect()
        };
        assert_eq!(ids("旁白"), vec![1, 3]);
        assert_eq!(ids("他"), vec![2, 5]);
        assert_eq!(ids("她"), vec![4]);

        let total: usize = grouped.values().map(Vec::len).sum();
        assert_eq!(total, dialogues.len());
    }

    #[test]
    fn test_silent_character_gets_empty_list() {
        let dialogues = vec![entry(1, "他", "你好。")];
        let grouped = group_by_speaker(&dialogues, &characters(&["他", "路人"])).unwrap();

        assert_eq!(grouped.len(), 2);
        assert!(grouped["路人"].is_empty());
    }

    #[test]
    fn test_undeclared_speaker_is_consistency_error() {
        let dialogues = vec![entry(1, "他", "你好。"), entry(2, "陌生人", "嗯。")];
        let err = group_by_speaker(&dialogues, &characters(&["他"])).unwrap_err();

        match err {
            DialogueError::Consistency { global_id, speaker } => {
                assert_eq!(global_id, 2);
                assert_eq!(speaker, "陌生人");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_speaker_match_is_case_sensitive() {
        let dialogues = vec![entry(1, "alice", "hi.")];
        let result = group_by_speaker(&dialogues, &characters(&["Alice"]));
        assert!(matches!(result, Err(DialogueError::Consistency { .. })));
    }

    #[test]
    fn test_execute_stage3_builds_result() {
        let merged = MergedDialogue {
            characters: characters(&["他", "她"]),
            dialogues: vec![entry(1, "他", "你好。"), entry(2, "她", "你好。")],
            chunk_ends: vec![3],
        };

        let result = execute_stage3(merged).unwrap();
        assert_eq!(result.dialogue_count(), 2);
        assert_eq!(result.lines_for("他").len(), 1);
        assert_eq!(result.lines_for("她")[0].global_id, 2);
        assert!(result.lines_for("nobody").is_empty());
    }

    #[test]
    fn test_execute_stage3_names_offending_chunk() {
        let merged = MergedDialogue {
            characters: characters(&["A"]),
            dialogues: vec![
                entry(1, "A", "一。"),
                entry(2, "A", "二。"),
                entry(3, "Z", "三。"),
            ],
            chunk_ends: vec![3, 4],
        };

        let err = execute_stage3(merged).unwrap_err();
        assert_eq!(err.chunk_index(), Some(2));
        match err {
            DialogueError::ChunkFailed { total, source, .. } => {
                assert_eq!(total, 2);
                assert!(matches!(*source, DialogueError::Consistency { global_id: 3, .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
