pub mod compositor;
pub mod encoder;
pub mod frame_buffer;
pub mod frame_stage;
pub mod recorder;
pub mod stage;

pub use compositor::Compositor;
pub use encoder::VideoEncoder;
pub use frame_buffer::FrameBuffer;
pub use frame_stage::{FrameFormat, FrameStage};
pub use recorder::{RecordingStage, StageCall};
pub use stage::{Animation, Stage};
