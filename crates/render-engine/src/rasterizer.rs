//! Frame rasterization with an optional stabilization loop.
//!
//! Surfaces that decode lazily can return a capture taken before the image
//! finished decoding. For those, the frame is captured repeatedly and the
//! loop stops at the first capture whose encoded size grew by more than the
//! threshold over the previous one, taken as the sign the image landed.

use lapse_common::config::{ExportDefaults, StabilizationSetting};
use lapse_common::error::LapseResult;
use lapse_project_model::FrameId;

use crate::surface::{CaptureSurface, DecodeMode};

/// Default capture attempts for race-prone surfaces.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
/// Default growth, in percent, that ends the loop.
pub const DEFAULT_GROWTH_THRESHOLD_PCT: f64 = 50.0;

/// When and how hard to retry captures.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StabilizationPolicy {
    pub mode: StabilizationSetting,
    pub max_attempts: u32,
    pub growth_threshold_pct: f64,
}

impl Default for StabilizationPolicy {
    fn default() -> Self {
        Self {
            mode: StabilizationSetting::Auto,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            growth_threshold_pct: DEFAULT_GROWTH_THRESHOLD_PCT,
        }
    }
}

impl StabilizationPolicy {
    pub fn from_config(config: &ExportDefaults) -> Self {
        Self {
            mode: config.stabilization,
            max_attempts: config.max_capture_attempts.max(1),
            growth_threshold_pct: config.growth_threshold_pct,
        }
    }

    /// Whether captures on a surface with this decode mode are retried.
    pub fn applies_to(&self, decode_mode: DecodeMode) -> bool {
        match self.mode {
            StabilizationSetting::Always => true,
            StabilizationSetting::Never => false,
            StabilizationSetting::Auto => decode_mode == DecodeMode::Deferred,
        }
    }

    fn attempts_for(&self, decode_mode: DecodeMode) -> u32 {
        if self.applies_to(decode_mode) {
            self.max_attempts.max(1)
        } else {
            1
        }
    }
}

/// One rasterized frame.
#[derive(Debug, Clone)]
pub struct RasterImage {
    pub frame_id: FrameId,
    pub png: Vec<u8>,
    /// Captures taken to produce `png`.
    pub attempts: u32,
}

/// Capture a mounted frame as PNG.
///
/// Every attempt is preceded by a cooperative yield. A capture error ends the
/// call immediately and is never retried.
pub async fn rasterize<S>(
    surface: &mut S,
    frame_id: &FrameId,
    policy: &StabilizationPolicy,
) -> LapseResult<RasterImage>
where
    S: CaptureSurface + ?Sized,
{
    let max_attempts = policy.attempts_for(surface.decode_mode());
    let mut previous_len: Option<usize> = None;
    let mut png = Vec::new();
    let mut attempts = 0;

    while attempts < max_attempts {
        tokio::task::yield_now().await;
        png = surface.capture(frame_id)?;
        attempts += 1;

        let len = png.len();
        if let Some(prev) = previous_len {
            if growth_exceeds(prev, len, policy.growth_threshold_pct) {
                tracing::debug!(
                    frame_id = %frame_id,
                    attempts,
                    previous_bytes = prev,
                    bytes = len,
                    "Capture stabilized"
                );
                break;
            }
        }
        previous_len = Some(len);
    }

    tracing::trace!(frame_id = %frame_id, attempts, bytes = png.len(), "Rasterized frame");
    Ok(RasterImage {
        frame_id: frame_id.clone(),
        png,
        attempts,
    })
}

/// Whether `current` grew more than `threshold_pct` percent over `previous`.
///
/// Growth from an empty capture counts as unbounded.
pub fn growth_exceeds(previous: usize, current: usize, threshold_pct: f64) -> bool {
    if previous == 0 {
        return current > 0;
    }
    let growth = (current as f64 - previous as f64) / previous as f64 * 100.0;
    growth > threshold_pct
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compositor::FrameComposition;
    use lapse_common::error::LapseError;

    struct ScriptedSurface {
        sizes: Vec<usize>,
        calls: usize,
        mode: DecodeMode,
    }

    impl ScriptedSurface {
        fn new(mode: DecodeMode, sizes: &[usize]) -> Self {
            Self {
                sizes: sizes.to_vec(),
                calls: 0,
                mode,
            }
        }
    }

    impl CaptureSurface for ScriptedSurface {
        fn mount(&mut self, _compositions: Vec<FrameComposition>) {}
        fn unmount_all(&mut self) {}

        fn capture(&mut self, _frame_id: &FrameId) -> LapseResult<Vec<u8>> {
            let size = *self
                .sizes
                .get(self.calls)
                .ok_or_else(|| LapseError::rasterize("script exhausted"))?;
            self.calls += 1;
            Ok(vec![0; size])
        }

        fn decode_mode(&self) -> DecodeMode {
            self.mode
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    #[test]
    fn test_growth_threshold() {
        assert!(!growth_exceeds(100, 150, 50.0));
        assert!(growth_exceeds(100, 151, 50.0));
        assert!(growth_exceeds(0, 1, 50.0));
        assert!(!growth_exceeds(0, 0, 50.0));
        assert!(!growth_exceeds(100, 20, 50.0));
    }

    #[tokio::test]
    async fn test_synchronous_surface_captures_once() {
        let mut surface = ScriptedSurface::new(DecodeMode::Synchronous, &[10, 100]);
        let raster = rasterize(&mut surface, &FrameId::from("a"), &StabilizationPolicy::default())
            .await
            .unwrap();
        assert_eq!(raster.attempts, 1);
        assert_eq!(raster.png.len(), 10);
    }

    #[tokio::test]
    async fn test_deferred_surface_stops_on_growth() {
        let mut surface = ScriptedSurface::new(DecodeMode::Deferred, &[100, 110, 400, 410, 420]);
        let raster = rasterize(&mut surface, &FrameId::from("a"), &StabilizationPolicy::default())
            .await
            .unwrap();
        assert_eq!(raster.attempts, 3);
        assert_eq!(raster.png.len(), 400);
    }

    #[tokio::test]
    async fn test_deferred_surface_gives_up_at_limit() {
        let mut surface = ScriptedSurface::new(DecodeMode::Deferred, &[100, 101, 102, 103, 104, 999]);
        let raster = rasterize(&mut surface, &FrameId::from("a"), &StabilizationPolicy::default())
            .await
            .unwrap();
        assert_eq!(raster.attempts, 5);
        assert_eq!(raster.png.len(), 104);
    }

    #[tokio::test]
    async fn test_config_override_forces_single_attempt() {
        let mut surface = ScriptedSurface::new(DecodeMode::Deferred, &[100, 1000]);
        let policy = StabilizationPolicy {
            mode: StabilizationSetting::Never,
            ..StabilizationPolicy::default()
        };
        let raster = rasterize(&mut surface, &FrameId::from("a"), &policy).await.unwrap();
        assert_eq!(raster.attempts, 1);
    }

    #[tokio::test]
    async fn test_capture_error_is_not_retried() {
        let mut surface = ScriptedSurface::new(DecodeMode::Deferred, &[]);
        let err = rasterize(&mut surface, &FrameId::from("a"), &StabilizationPolicy::default())
            .await
            .unwrap_err();
        assert!(err.is_rasterize());
        assert_eq!(surface.calls, 0);
    }
}
