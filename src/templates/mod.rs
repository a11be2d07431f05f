pub mod builders;
pub mod expression;

use crate::content::Content;
use crate::errors::TemplateError;
use crate::scene::SceneObject;
use crate::timeline::TimelineEntry;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::{Path, PathBuf};

/// Calling convention shared by every template: normalized content and the
/// entry's timestamp in, a renderable out
pub type Constructor = fn(&str, f64, &TemplateContext) -> Result<SceneObject, TemplateError>;

/// Environment a constructor may need beyond its content
#[derive(Debug, Clone)]
pub struct TemplateContext {
    /// Relative image paths resolve against this directory
    pub asset_root: PathBuf,
}

impl TemplateContext {
    pub fn new(asset_root: impl AsRef<Path>) -> Self {
        Self {
            asset_root: asset_root.as_ref().to_path_buf(),
        }
    }

    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.asset_root.join(path)
        }
    }
}

impl Default for TemplateContext {
    fn default() -> Self {
        Self::new(".")
    }
}

/// The closed set of templates a timeline may name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum TemplateKind {
    TextIntro,
    TextOutro,
    BulletPoints,
    ImageDisplay,
    EquationDisplay,
    StepByStep,
    GraphPlot,
    HighlightText,
    Transformation,
    DefinitionBox,
    ProofSteps,
    Comparison,
}

impl TemplateKind {
    pub const ALL: [TemplateKind; 12] = [
        TemplateKind::TextIntro,
        TemplateKind::TextOutro,
        TemplateKind::BulletPoints,
        TemplateKind::ImageDisplay,
        TemplateKind::EquationDisplay,
        TemplateKind::StepByStep,
        TemplateKind::GraphPlot,
        TemplateKind::HighlightText,
        TemplateKind::Transformation,
        TemplateKind::DefinitionBox,
        TemplateKind::ProofSteps,
        TemplateKind::Comparison,
    ];

    /// Key used for this template in timeline files
    pub fn name(self) -> &'static str {
        match self {
            TemplateKind::TextIntro => "text_intro",
            TemplateKind::TextOutro => "text_outro",
            TemplateKind::BulletPoints => "bullet_points",
            TemplateKind::ImageDisplay => "image_display",
            TemplateKind::EquationDisplay => "equation_display",
            TemplateKind::StepByStep => "step_by_step",
            TemplateKind::GraphPlot => "graph_plot",
            TemplateKind::HighlightText => "highlight_text",
            TemplateKind::Transformation => "transformation",
            TemplateKind::DefinitionBox => "definition_box",
            TemplateKind::ProofSteps => "proof_steps",
            TemplateKind::Comparison => "comparison",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    pub fn constructor(self) -> Constructor {
        match self {
            TemplateKind::TextIntro => builders::text_intro,
            TemplateKind::TextOutro => builders::text_outro,
            TemplateKind::BulletPoints => builders::bullet_points,
            TemplateKind::ImageDisplay => builders::image_display,
            TemplateKind::EquationDisplay => builders::equation_display,
            TemplateKind::StepByStep => builders::step_by_step,
            TemplateKind::GraphPlot => builders::graph_plot,
            TemplateKind::HighlightText => builders::highlight_text,
            TemplateKind::Transformation => builders::transformation,
            TemplateKind::DefinitionBox => builders::definition_box,
            TemplateKind::ProofSteps => builders::proof_steps,
            TemplateKind::Comparison => builders::comparison,
        }
    }

    pub fn construct(
        self,
        content: &str,
        timestamp: f64,
        ctx: &TemplateContext,
    ) -> Result<SceneObject, TemplateError> {
        (self.constructor())(content, timestamp, ctx)
    }
}

impl std::fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Sample timeline entries, one per template, for bootstrapping timeline files
pub struct TemplateSample;

impl TemplateSample {
    pub fn generate(kind: TemplateKind, duration: f64) -> TimelineEntry {
        TimelineEntry::new(kind.name(), Self::content(kind), 0.0, duration)
    }

    fn content(kind: TemplateKind) -> Content {
        let value = match kind {
            TemplateKind::TextIntro => json!("Introduction to Derivatives"),
            TemplateKind::TextOutro => json!("Thanks for watching"),
            TemplateKind::BulletPoints => json!([
                "Rate of change",
                "Slope of the tangent line",
                "Limit of a difference quotient"
            ]),
            TemplateKind::ImageDisplay => json!("images/diagram.png"),
            TemplateKind::EquationDisplay => json!("f'(x) = lim (f(x+h) - f(x)) / h"),
            TemplateKind::StepByStep => json!([
                "Write the difference quotient",
                "Simplify the numerator",
                "Take the limit as h -> 0"
            ]),
            TemplateKind::GraphPlot => json!({ "equation": "y = x^2" }),
            TemplateKind::HighlightText => json!("The derivative measures instantaneous change"),
            TemplateKind::Transformation => json!({ "from": "x^2", "to": "2x" }),
            TemplateKind::DefinitionBox => {
                json!("Derivative: the limit of the average rate of change")
            }
            TemplateKind::ProofSteps => json!([
                "Let f(x) = x^2",
                "(x+h)^2 - x^2 = 2xh + h^2",
                "Divide by h and let h -> 0",
                "Therefore f'(x) = 2x"
            ]),
            TemplateKind::Comparison => json!({ "left": "Average rate", "right": "Instantaneous rate" }),
        };
        Content::from(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_has_twelve_unique_names() {
        let mut names: Vec<_> = TemplateKind::ALL.iter().map(|k| k.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 12);
    }

    #[test]
    fn test_from_name_round_trips() {
        for kind in TemplateKind::ALL {
            assert_eq!(TemplateKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(TemplateKind::from_name("Text_Intro"), None);
        assert_eq!(TemplateKind::from_name(""), None);
    }

    #[test]
    fn test_serde_names_match_registry_keys() {
        let json = serde_json::to_string(&TemplateKind::EquationDisplay).unwrap();
        assert_eq!(json, "\"equation_display\"");
    }

    #[test]
    fn test_samples_construct() {
        let ctx = TemplateContext::default();
        for kind in TemplateKind::ALL {
            if kind == TemplateKind::ImageDisplay {
                continue; // needs a file on disk
            }
            let entry = TemplateSample::generate(kind, 5.0);
            assert_eq!(entry.duration(), 5.0);
            let object = kind
                .construct(&entry.content.normalize(), entry.timestamp(), &ctx)
                .unwrap_or_else(|e| panic!("{} failed: {}", kind, e));
            assert_eq!(object.template, kind);
            assert!(!object.shapes.is_empty());
        }
    }

    #[test]
    fn test_context_resolves_relative_paths() {
        let ctx = TemplateContext::new("/assets");
        assert_eq!(ctx.resolve(Path::new("a.png")), PathBuf::from("/assets/a.png"));
        assert_eq!(ctx.resolve(Path::new("/tmp/b.png")), PathBuf::from("/tmp/b.png"));
    }
}
