mod compute_pass;

use glam::UVec2;

pub use self::compute_pass::*;
use crate::gpu::{CommandBuffer, Pipeline};

/// Frame being recorded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameContext {
    /// Extent of the G-buffer, in pixels
    pub size: UVec2,

    /// Parity of the frame; selects which half of every double-buffered
    /// resource is the current one.
    pub alternate: bool,
}

/// Node of the frame graph.
pub trait Pass {
    fn label(&self) -> &str;

    /// Records this pass, including the barriers it needs on entry and exit.
    fn issue_commands(
        &self,
        cmd: &mut dyn CommandBuffer,
        frame: &FrameContext,
    );

    fn pipelines(&self) -> Vec<Pipeline>;
}
