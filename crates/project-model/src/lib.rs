//! Lapse Project Model
//!
//! Defines the core data contracts for Lapse projects:
//! - **Transform:** Per-frame pan, zoom and rotation, with pan stored as a
//!   fraction of the display container
//! - **Frame / Project:** Ordered photographs with caption and visibility
//! - **Stores:** The [`FrameStore`] seam plus memory and directory stores
//! - **Bundles:** Single-file JSON import/export
//!
//! Positions are normalized to the container so an alignment made at one
//! display size lines up identically at any other.

pub mod bundle;
pub mod directory;
pub mod frame;
pub mod playback;
pub mod project;
pub mod store;
pub mod transform;

pub use bundle::Bundle;
pub use directory::DirectoryStore;
pub use frame::*;
pub use playback::*;
pub use project::*;
pub use store::*;
pub use transform::*;
