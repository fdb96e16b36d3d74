//! Lapse Alignment
//!
//! Editing-time behavior for a single frame:
//! - **Controller:** Drag, zoom and rotate gestures committed to a [`FrameStore`]
//! - **Bounds:** Drag limits derived from the measured container
//! - **Ghost:** The previous frame drawn translucently as an alignment guide
//! - **Static views:** Read-only placement for thumbnails and previews
//!
//! No rendering happens here. Outputs are placements that the render engine
//! composes.
//!
//! [`FrameStore`]: lapse_project_model::FrameStore

pub mod bounds;
pub mod controller;
pub mod ghost;
pub mod view;

pub use bounds::DragBounds;
pub use controller::{AlignmentController, AlignmentError};
pub use ghost::{ghost_for, GHOST_OPACITY};
pub use view::StaticView;
