//! Ghost overlay: the previous frame as a translucent alignment guide.

use lapse_project_model::{EditorSettings, Frame};

use crate::view::StaticView;

/// Opacity of the ghost layer.
pub const GHOST_OPACITY: f32 = 0.3;

/// Ghost layer for the frame at `index` in the full frame list.
///
/// The ghost is the frame directly before it (hidden or not) drawn with its
/// own transform and caption. There is none for the first frame or when the
/// ghost setting is off.
pub fn ghost_for(frames: &[Frame], index: usize, settings: &EditorSettings) -> Option<StaticView> {
    if !settings.ghost || index == 0 || index >= frames.len() {
        return None;
    }
    let previous = &frames[index - 1];
    Some(StaticView::of(previous).with_opacity(GHOST_OPACITY))
}
