pub mod config;
pub mod content;
pub mod errors;
pub mod ingestion;
pub mod parser;
pub mod player;
pub mod renderer;
pub mod scene;
pub mod templates;
pub mod timeline;

pub use config::AppConfig;
pub use content::Content;
pub use ingestion::ExtractedDocument;
pub use parser::TimelineParser;
pub use player::{PlaybackReport, TimelinePlayer};
pub use renderer::{FrameStage, RecordingStage, Stage};
pub use scene::SceneObject;
pub use templates::{TemplateContext, TemplateKind};
pub use timeline::TimelineEntry;
