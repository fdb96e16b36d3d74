//! Lapse Render Engine
//!
//! Turns aligned frames into pictures and pictures into video.
//!
//! # Pipeline Architecture
//!
//! ```text
//! FrameStore ──► visible frames (in order)
//!                      │
//!                      ▼
//!        CaptureSurface::mount (one composition per frame)
//!                      │
//!                      ▼
//!        rasterize ×N (sequential, optional stabilization)
//!                      │
//!                      ▼
//!        frame-{i}.png + input.txt ──► EncodingEngine (ffmpeg, H.264)
//!                                               │
//!                                               ▼
//!                                        timelapse.mp4
//! ```

pub mod assembler;
pub mod caption;
pub mod compositor;
pub mod engine;
pub mod export;
pub mod flip;
pub mod manifest;
pub mod rasterizer;
pub mod surface;

pub use assembler::{assemble, EncodeSettings, EncodedFrame, VideoArtifact};
pub use compositor::{Compositor, FrameComposition};
pub use engine::{EncodingEngine, FfmpegEngine};
pub use export::*;
pub use flip::{flip_frame, flip_image};
pub use rasterizer::{rasterize, RasterImage, StabilizationPolicy};
pub use surface::{CaptureSurface, DecodeMode, OffscreenSurface};
