//! Export orchestration: visible frames in, one video out.
//!
//! ```text
//! Idle ──► Capturing ──► Encoding ──► Done ──► Idle
//!              │             │
//!              └─────────────┴──────► Failed ──► Idle
//! ```
//!
//! One job runs at a time. The capture surface and encoding engine are owned
//! by the orchestrator and lent to a single job; a request arriving while
//! they are taken is rejected, never queued.

use std::sync::{Arc, Mutex};

use lapse_common::config::ExportDefaults;
use lapse_common::error::{LapseError, LapseResult};
use lapse_project_model::{Frame, FrameStore, PlaybackSpeed, ProjectId};
use serde::Serialize;

use crate::assembler::{assemble, EncodeSettings, EncodedFrame, VideoArtifact};
use crate::compositor::FrameComposition;
use crate::engine::EncodingEngine;
use crate::rasterizer::{rasterize, StabilizationPolicy};
use crate::surface::CaptureSurface;

/// Where the orchestrator is in its job lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportState {
    Idle,
    Capturing,
    Encoding,
    Done,
    Failed,
}

/// Export progress report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExportProgress {
    pub stage: ExportState,

    /// Frames rasterized so far.
    pub frames_captured: usize,

    /// Visible frames in the job.
    pub total_frames: usize,
}

/// Progress callback for export jobs.
pub type ProgressCallback = Box<dyn Fn(ExportProgress) + Send + Sync>;

struct Resources<S, E> {
    surface: S,
    engine: E,
}

/// Runs export jobs against a frame store, one at a time.
pub struct ExportOrchestrator<S, E> {
    store: Arc<dyn FrameStore>,
    resources: tokio::sync::Mutex<Resources<S, E>>,
    state: Mutex<ExportState>,
    last_outcome: Mutex<Option<ExportState>>,
    // Counts from the latest progress report, carried into a failure report.
    counts: Mutex<(usize, usize)>,
    policy: StabilizationPolicy,
    encode: EncodeSettings,
    progress: Option<ProgressCallback>,
}

impl<S, E> ExportOrchestrator<S, E>
where
    S: CaptureSurface,
    E: EncodingEngine,
{
    pub fn new(store: Arc<dyn FrameStore>, surface: S, engine: E) -> Self {
        Self {
            store,
            resources: tokio::sync::Mutex::new(Resources { surface, engine }),
            state: Mutex::new(ExportState::Idle),
            last_outcome: Mutex::new(None),
            counts: Mutex::new((0, 0)),
            policy: StabilizationPolicy::default(),
            encode: EncodeSettings::default(),
            progress: None,
        }
    }

    pub fn with_policy(mut self, policy: StabilizationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_encode_settings(mut self, encode: EncodeSettings) -> Self {
        self.encode = encode;
        self
    }

    /// Apply stabilization settings from the loaded config.
    pub fn with_config(self, config: &ExportDefaults) -> Self {
        self.with_policy(StabilizationPolicy::from_config(config))
    }

    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn state(&self) -> ExportState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Final state of the most recent job, if any ran.
    pub fn last_outcome(&self) -> Option<ExportState> {
        *self.last_outcome.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Export the visible frames of a project as one video.
    ///
    /// Returns [`LapseError::ExportInProgress`] if a job is already running.
    /// The store is only read.
    pub async fn run_export(
        &self,
        project_id: &ProjectId,
        speed: PlaybackSpeed,
    ) -> LapseResult<VideoArtifact> {
        let mut resources = self.resources.try_lock().map_err(|_| {
            tracing::warn!(project_id = %project_id, "Export rejected: job already running");
            LapseError::ExportInProgress
        })?;

        tracing::info!(project_id = %project_id, speed = %speed, "Starting export");
        *self.counts.lock().unwrap_or_else(|e| e.into_inner()) = (0, 0);
        let result = self.run_job(&mut resources, project_id, speed).await;
        resources.surface.unmount_all();

        let outcome = match &result {
            Ok(artifact) => {
                tracing::info!(
                    project_id = %project_id,
                    bytes = artifact.bytes.len(),
                    "Export complete"
                );
                ExportState::Done
            }
            Err(e) => {
                let (captured, total) = *self.counts.lock().unwrap_or_else(|e| e.into_inner());
                tracing::error!(
                    project_id = %project_id,
                    frames_captured = captured,
                    total_frames = total,
                    error = %e,
                    "Export failed"
                );
                self.report(ExportState::Failed, captured, total);
                ExportState::Failed
            }
        };
        self.set_state(outcome);
        *self.last_outcome.lock().unwrap_or_else(|e| e.into_inner()) = Some(outcome);
        self.set_state(ExportState::Idle);

        result
    }

    async fn run_job(
        &self,
        resources: &mut Resources<S, E>,
        project_id: &ProjectId,
        speed: PlaybackSpeed,
    ) -> LapseResult<VideoArtifact> {
        let frames = self
            .store
            .list_frames(project_id)
            .map_err(|e| LapseError::project(e.to_string()))?;
        let visible: Vec<Frame> = frames.into_iter().filter(Frame::is_visible).collect();
        if visible.is_empty() {
            return Err(LapseError::NothingToExport {
                project_id: project_id.to_string(),
            });
        }

        let total = visible.len();
        self.set_state(ExportState::Capturing);
        self.report(ExportState::Capturing, 0, total);

        resources
            .surface
            .mount(visible.iter().map(FrameComposition::for_export).collect());

        let duration_ms = speed.frame_duration_ms();
        let mut encoded = Vec::with_capacity(total);
        for frame in &visible {
            let raster = rasterize(&mut resources.surface, &frame.id, &self.policy).await?;
            encoded.push(EncodedFrame {
                png: raster.png,
                duration_ms,
            });
            self.report(ExportState::Capturing, encoded.len(), total);
        }

        self.set_state(ExportState::Encoding);
        self.report(ExportState::Encoding, total, total);
        let artifact = assemble(&mut resources.engine, &encoded, &self.encode).await?;

        self.report(ExportState::Done, total, total);
        Ok(artifact)
    }

    fn set_state(&self, state: ExportState) {
        *self.state.lock().unwrap_or_else(|e| e.into_inner()) = state;
    }

    fn report(&self, stage: ExportState, frames_captured: usize, total_frames: usize) {
        *self.counts.lock().unwrap_or_else(|e| e.into_inner()) = (frames_captured, total_frames);
        if let Some(cb) = &self.progress {
            cb(ExportProgress {
                stage,
                frames_captured,
                total_frames,
            });
        }
    }
}
