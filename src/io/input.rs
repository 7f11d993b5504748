use std::path::Path;

use anyhow::{Context, Result};

/// Read a UTF-8 narrative file, dropping a leading byte-order mark
pub fn read_source_text(path: &Path) -> Result<String> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {:?}", path))?;
    Ok(strip_bom(content))
}

fn strip_bom(content: String) -> String {
    match content.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => content,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_source_text_strips_bom() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("novel.txt");
        std::fs::write(&path, "\u{feff}他说：你好。").unwrap();

        let text = read_source_text(&path).unwrap();
        assert_eq!(text, "他说：你好。");
    }

    #[test]
    fn test_missing_file_reports_path() {
        let err = read_source_text(Path::new("/nonexistent/novel.txt")).unwrap_err();
        assert!(format!("{:#}", err).contains("novel.txt"));
    }
}
