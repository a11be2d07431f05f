use crate::renderer::{Animation, Stage};
use crate::scene::SceneObject;
use crate::templates::{TemplateContext, TemplateKind};
use crate::timeline::TimelineEntry;
use anyhow::Result;
use log::{debug, warn};
use serde::Serialize;

/// Run time of the fade-out that clears the stage between entries
pub const CROSS_FADE: f64 = 0.5;
/// Share of an entry's duration spent fading in, capped at [`MAX_FADE_IN`]
pub const FADE_IN_RATIO: f64 = 0.3;
pub const MAX_FADE_IN: f64 = 1.0;

/// Split an entry's duration into `(fade_in, wait)`
pub fn fade_timing(duration: f64) -> (f64, f64) {
    let fade_in = MAX_FADE_IN.min(duration * FADE_IN_RATIO);
    let wait = (duration - fade_in).max(0.0);
    (fade_in, wait)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    NonPositiveDuration,
    UnknownTemplate { name: String },
    ConstructionFailed { template: TemplateKind, error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedEntry {
    pub index: usize,
    #[serde(flatten)]
    pub reason: SkipReason,
}

/// What happened to each entry of a playback run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PlaybackReport {
    pub rendered: usize,
    pub skipped: Vec<SkippedEntry>,
}

/// Plays timeline entries one after another on a [`Stage`], keeping at most
/// one object on screen.
pub struct TimelinePlayer {
    context: TemplateContext,
    current: Option<SceneObject>,
}

impl TimelinePlayer {
    pub fn new(context: TemplateContext) -> Self {
        Self {
            context,
            current: None,
        }
    }

    /// Object occupying the slot, if any
    pub fn current(&self) -> Option<&SceneObject> {
        self.current.as_ref()
    }

    /// Play every entry in array order, then clear the stage.
    ///
    /// Unknown templates and failing constructors skip their entry with a
    /// warning; only stage errors abort playback.
    pub fn play<S: Stage + ?Sized>(
        &mut self,
        entries: &[TimelineEntry],
        stage: &mut S,
    ) -> Result<PlaybackReport> {
        let mut report = PlaybackReport::default();

        for (index, entry) in entries.iter().enumerate() {
            match self.play_entry(index, entry, stage)? {
                Some(reason) => report.skipped.push(SkippedEntry { index, reason }),
                None => report.rendered += 1,
            }
        }

        if let Some(object) = self.current.take() {
            stage.play(
                Animation::FadeOut(std::slice::from_ref(&object)),
                CROSS_FADE,
            )?;
        }

        Ok(report)
    }

    fn play_entry<S: Stage + ?Sized>(
        &mut self,
        index: usize,
        entry: &TimelineEntry,
        stage: &mut S,
    ) -> Result<Option<SkipReason>> {
        let duration = entry.duration();
        if duration <= 0.0 {
            debug!("Skipping entry {}: non-positive duration {}", index, duration);
            return Ok(Some(SkipReason::NonPositiveDuration));
        }

        let Some(kind) = TemplateKind::from_name(&entry.template_name) else {
            warn!("Template '{}' not found in registry", entry.template_name);
            return Ok(Some(SkipReason::UnknownTemplate {
                name: entry.template_name.clone(),
            }));
        };

        let content = entry.content.normalize();
        let object = match kind.construct(&content, entry.timestamp(), &self.context) {
            Ok(object) => object.with_id(index),
            Err(e) => {
                warn!("Error creating object for template '{}': {}", kind, e);
                return Ok(Some(SkipReason::ConstructionFailed {
                    template: kind,
                    error: e.to_string(),
                }));
            }
        };

        if let Some(previous) = self.current.take() {
            stage.play(
                Animation::FadeOut(std::slice::from_ref(&previous)),
                CROSS_FADE,
            )?;
        }

        let (fade_in, wait) = fade_timing(duration);
        stage.play(Animation::FadeIn(&object), fade_in)?;
        self.current = Some(object);

        if wait > 0.0 {
            stage.wait(wait)?;
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::Content;
    use crate::renderer::{RecordingStage, StageCall};
    use serde_json::json;

    fn entry(template: &str, content: serde_json::Value, start: f64, end: f64) -> TimelineEntry {
        TimelineEntry::new(template, Content::from(content), start, end)
    }

    fn run(entries: &[TimelineEntry]) -> (PlaybackReport, Vec<StageCall>) {
        let mut player = TimelinePlayer::new(TemplateContext::default());
        let mut stage = RecordingStage::new();
        let report = player.play(entries, &mut stage).unwrap();
        assert!(player.current().is_none());
        (report, stage.into_calls())
    }

    #[test]
    fn test_fade_timing() {
        let (fade_in, wait) = fade_timing(2.0);
        assert!((fade_in - 0.6).abs() < 1e-9);
        assert!((wait - 1.4).abs() < 1e-9);
        assert_eq!(fade_timing(10.0), (1.0, 9.0));
        for duration in [0.01, 0.5, 1.0, 3.333, 100.0] {
            let (fade_in, wait) = fade_timing(duration);
            assert!(fade_in <= MAX_FADE_IN);
            assert!(wait >= 0.0);
        }
    }

    #[test]
    fn test_two_entries_call_sequence() {
        let entries = vec![
            entry("text_intro", json!("Hello"), 0.0, 4.0),
            entry("text_outro", json!("Bye"), 4.0, 14.0),
        ];
        let (report, calls) = run(&entries);

        assert_eq!(report.rendered, 2);
        assert!(report.skipped.is_empty());
        assert_eq!(
            calls,
            vec![
                StageCall::FadeIn {
                    object: 0,
                    template: TemplateKind::TextIntro,
                    run_time: 1.0
                },
                StageCall::Wait { duration: 3.0 },
                StageCall::FadeOut {
                    objects: vec![0],
                    run_time: CROSS_FADE
                },
                StageCall::FadeIn {
                    object: 1,
                    template: TemplateKind::TextOutro,
                    run_time: 1.0
                },
                StageCall::Wait { duration: 9.0 },
                StageCall::FadeOut {
                    objects: vec![1],
                    run_time: CROSS_FADE
                },
            ]
        );
    }

    #[test]
    fn test_non_positive_duration_has_no_side_effect() {
        let entries = vec![
            entry("text_intro", json!("zero"), 3.0, 3.0),
            entry("text_intro", json!("negative"), 5.0, 1.0),
        ];
        let (report, calls) = run(&entries);

        assert!(calls.is_empty());
        assert_eq!(report.rendered, 0);
        assert_eq!(
            report.skipped.iter().map(|s| &s.reason).collect::<Vec<_>>(),
            vec![&SkipReason::NonPositiveDuration, &SkipReason::NonPositiveDuration]
        );
    }

    #[test]
    fn test_skipped_entry_between_keeps_object_on_screen() {
        let entries = vec![
            entry("text_intro", json!("Hello"), 0.0, 1.0),
            entry("text_intro", json!("skipped"), 1.0, 1.0),
            entry("highlight_text", json!("Next"), 1.0, 2.0),
        ];
        let (_, calls) = run(&entries);

        let fade_outs: Vec<_> = calls
            .iter()
            .filter_map(|c| match c {
                StageCall::FadeOut { objects, .. } => Some(objects.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(fade_outs, vec![vec![0], vec![2]]);
    }

    #[test]
    fn test_unknown_template_is_skipped() {
        let entries = vec![
            entry("sparkle_wipe", json!("?"), 0.0, 2.0),
            entry("bullet_points", json!(["a", "b"]), 2.0, 4.0),
        ];
        let (report, calls) = run(&entries);

        assert_eq!(report.rendered, 1);
        assert_eq!(
            report.skipped,
            vec![SkippedEntry {
                index: 0,
                reason: SkipReason::UnknownTemplate {
                    name: "sparkle_wipe".into()
                }
            }]
        );
        assert!(matches!(calls[0], StageCall::FadeIn { object: 1, .. }));
    }

    #[test]
    fn test_null_template_name_is_skipped() {
        let entries: Vec<TimelineEntry> = serde_json::from_str(
            r#"[
                {"templateName": null, "content": "?", "startTime": 0, "endTime": 2},
                {"templateName": "text_intro", "content": "Hello", "startTime": 2, "endTime": 6}
            ]"#,
        )
        .unwrap();
        let (report, calls) = run(&entries);

        assert_eq!(report.rendered, 1);
        assert_eq!(
            report.skipped,
            vec![SkippedEntry {
                index: 0,
                reason: SkipReason::UnknownTemplate { name: String::new() }
            }]
        );
        assert!(matches!(calls[0], StageCall::FadeIn { object: 1, .. }));
    }

    #[test]
    fn test_construction_failure_leaves_slot_unchanged() {
        let entries = vec![
            entry("text_intro", json!("Hello"), 0.0, 5.0),
            // no '|' separator
            entry("comparison", json!("just one side"), 5.0, 7.0),
        ];
        let (report, calls) = run(&entries);

        assert_eq!(report.rendered, 1);
        assert!(matches!(
            report.skipped[0].reason,
            SkipReason::ConstructionFailed {
                template: TemplateKind::Comparison,
                ..
            }
        ));
        // Intro is faded out exactly once: by the final cleanup
        assert_eq!(
            calls,
            vec![
                StageCall::FadeIn {
                    object: 0,
                    template: TemplateKind::TextIntro,
                    run_time: 1.0
                },
                StageCall::Wait { duration: 4.0 },
                StageCall::FadeOut {
                    objects: vec![0],
                    run_time: CROSS_FADE
                },
            ]
        );
    }

    #[test]
    fn test_short_entry_still_waits() {
        let (_, calls) = run(&[entry("text_intro", json!("Hi"), 0.0, 0.1)]);
        assert_eq!(calls.len(), 3);
        assert!(matches!(calls[1], StageCall::Wait { .. }));
    }

    #[test]
    fn test_timestamp_defaults_to_start_time() {
        let mut with_timestamp = entry("text_intro", json!("Hi"), 4.0, 6.0);
        with_timestamp.timestamp = Some(1.25);
        assert_eq!(with_timestamp.timestamp(), 1.25);

        let without = entry("text_intro", json!("Hi"), 4.0, 6.0);
        assert_eq!(without.timestamp(), 4.0);
    }

    #[test]
    fn test_bundled_timeline_plays() {
        let path = crate::parser::TimelineParser::default_path();
        let entries = crate::parser::TimelineParser::parse_json(&path).unwrap();
        let (report, calls) = run(&entries);

        assert_eq!(report.rendered + report.skipped.len(), entries.len());
        assert_eq!(report.skipped.len(), 2);
        assert!(report
            .skipped
            .iter()
            .all(|s| !matches!(s.reason, SkipReason::ConstructionFailed { .. })));

        let fade_ins = calls
            .iter()
            .filter(|c| matches!(c, StageCall::FadeIn { .. }))
            .count();
        let fade_outs = calls
            .iter()
            .filter(|c| matches!(c, StageCall::FadeOut { .. }))
            .count();
        assert_eq!(fade_ins, report.rendered);
        assert_eq!(fade_outs, report.rendered);
    }
}
