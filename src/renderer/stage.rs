use crate::scene::SceneObject;
use anyhow::Result;

/// Timed transition the player asks a stage to perform
#[derive(Debug, Clone, Copy)]
pub enum Animation<'a> {
    FadeIn(&'a SceneObject),
    FadeOut(&'a [SceneObject]),
}

/// Animation capability the timeline player drives.
///
/// Both calls block until the transition (or hold) is complete from the
/// stage's point of view; the player never overlaps them.
pub trait Stage {
    fn play(&mut self, animation: Animation<'_>, run_time: f64) -> Result<()>;

    /// Hold the current frame for `duration` seconds
    fn wait(&mut self, duration: f64) -> Result<()>;
}
