use super::stage::{Animation, Stage};
use crate::templates::TemplateKind;
use anyhow::Result;
use serde::Serialize;

/// One call made against a stage
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum StageCall {
    FadeIn {
        object: usize,
        template: TemplateKind,
        run_time: f64,
    },
    FadeOut {
        objects: Vec<usize>,
        run_time: f64,
    },
    Wait {
        duration: f64,
    },
}

/// Stage that renders nothing and remembers every call, in order
#[derive(Debug, Default)]
pub struct RecordingStage {
    calls: Vec<StageCall>,
}

impl RecordingStage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> &[StageCall] {
        &self.calls
    }

    pub fn into_calls(self) -> Vec<StageCall> {
        self.calls
    }

    /// Seconds of output the recorded calls would take
    pub fn total_time(&self) -> f64 {
        self.calls
            .iter()
            .map(|call| match call {
                StageCall::FadeIn { run_time, .. } | StageCall::FadeOut { run_time, .. } => {
                    *run_time
                }
                StageCall::Wait { duration } => *duration,
            })
            .sum()
    }
}

impl Stage for RecordingStage {
    fn play(&mut self, animation: Animation<'_>, run_time: f64) -> Result<()> {
        let call = match animation {
            Animation::FadeIn(object) => StageCall::FadeIn {
                object: object.id,
                template: object.template,
                run_time,
            },
            Animation::FadeOut(objects) => StageCall::FadeOut {
                objects: objects.iter().map(|o| o.id).collect(),
                run_time,
            },
        };
        self.calls.push(call);
        Ok(())
    }

    fn wait(&mut self, duration: f64) -> Result<()> {
        self.calls.push(StageCall::Wait { duration });
        Ok(())
    }
}
