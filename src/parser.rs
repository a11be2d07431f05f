use crate::errors::TimelineError;
use crate::templates::TemplateKind;
use crate::timeline::TimelineEntry;
use std::path::{Path, PathBuf};

/// Timeline parser for JSON timeline files
pub struct TimelineParser;

impl TimelineParser {
    /// Timeline bundled with the crate, used when no path is given
    pub fn default_path() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("demos")
            .join("example_timeline.json")
    }

    /// Parse a JSON timeline file. The top-level value must be an array of entries.
    pub fn parse_json(path: &Path) -> Result<Vec<TimelineEntry>, TimelineError> {
        if !path.exists() {
            return Err(TimelineError::NotFound(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path).map_err(|source| TimelineError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let entries: Vec<TimelineEntry> =
            serde_json::from_str(&content).map_err(|source| TimelineError::Malformed {
                path: path.to_path_buf(),
                source,
            })?;

        log::info!(
            "Loaded {} timeline entries from {}",
            entries.len(),
            path.display()
        );

        Ok(entries)
    }

    /// Get a summary of the timeline
    pub fn summarize(entries: &[TimelineEntry]) -> String {
        let mut summary = String::new();
        let playable = entries.iter().filter(|e| e.is_playable()).count();
        let total: f64 = entries
            .iter()
            .filter(|e| e.is_playable())
            .map(TimelineEntry::duration)
            .sum();

        summary.push_str(&format!("Entries: {} ({} playable)\n", entries.len(), playable));
        summary.push_str(&format!("Playback time: {:.2}s\n", total));

        for (idx, entry) in entries.iter().enumerate() {
            // Same precedence as playback: duration before template lookup
            let marker = if !entry.is_playable() {
                " [skipped: no duration]"
            } else if TemplateKind::from_name(&entry.template_name).is_none() {
                " [skipped: unknown template]"
            } else {
                ""
            };
            summary.push_str(&format!(
                "  {}: '{}' {:.2}s-{:.2}s ({:.2}s){}\n",
                idx + 1,
                entry.template_name,
                entry.start_time,
                entry.end_time,
                entry.duration(),
                marker
            ));
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_valid_json() {
        let json = r#"
        [
            {"templateName": "text_intro", "content": "Hello", "startTime": 0, "endTime": 3},
            {"templateName": "bullet_points", "content": ["a", "b"], "startTime": 3, "endTime": 8}
        ]
        "#;

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let entries = TimelineParser::parse_json(file.path()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].content.normalize(), "a\nb");
    }

    #[test]
    fn test_parse_not_an_array() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"{"templateName": "text_intro"}"#).unwrap();

        let result = TimelineParser::parse_json(file.path());
        assert!(matches!(result, Err(TimelineError::Malformed { .. })));
    }

    #[test]
    fn test_parse_nonexistent_file() {
        let result = TimelineParser::parse_json(Path::new("/nonexistent/timeline.json"));
        assert!(matches!(result, Err(TimelineError::NotFound(_))));
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("JSON file not found"));
    }

    #[test]
    fn test_bundled_timeline_parses() {
        let entries = TimelineParser::parse_json(&TimelineParser::default_path()).unwrap();
        assert!(!entries.is_empty());
    }

    #[test]
    fn test_summarize() {
        let json = r#"[
            {"templateName": "text_intro", "content": "Hi", "startTime": 0, "endTime": 2},
            {"templateName": "nope", "content": "?", "startTime": 2, "endTime": 4},
            {"templateName": "text_outro", "content": "Bye", "startTime": 4, "endTime": 4}
        ]"#;
        let entries: Vec<TimelineEntry> = serde_json::from_str(json).unwrap();
        let summary = TimelineParser::summarize(&entries);

        assert!(summary.contains("Entries: 3 (2 playable)"));
        assert!(summary.contains("[skipped: unknown template]"));
        assert!(summary.contains("[skipped: no duration]"));
    }

    #[test]
    fn test_summarize_reports_duration_before_template() {
        let entries = vec![TimelineEntry::new("nope", "?".into(), 2.0, 2.0)];
        let summary = TimelineParser::summarize(&entries);

        assert!(summary.contains("'nope' 2.00s-2.00s (0.00s) [skipped: no duration]"));
        assert!(!summary.contains("unknown template"));
    }
}
