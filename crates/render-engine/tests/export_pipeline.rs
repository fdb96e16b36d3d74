use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use lapse_common::error::{LapseError, LapseResult};
use lapse_project_model::{
    Frame, FrameId, FrameStore, ImageSource, MemoryStore, PlaybackSpeed, ProjectId, ProjectStore,
};
use lapse_render_engine::{
    CaptureSurface, DecodeMode, EncodingEngine, ExportOrchestrator, ExportProgress, ExportState,
    FrameComposition,
};

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

#[derive(Default)]
struct SurfaceLog {
    mounted: Vec<FrameId>,
    captured: Vec<FrameId>,
}

/// Surface producing a fake PNG per frame, optionally failing on one frame.
struct FakeSurface {
    log: Arc<Mutex<SurfaceLog>>,
    fail_on: Option<FrameId>,
}

impl CaptureSurface for FakeSurface {
    fn mount(&mut self, compositions: Vec<FrameComposition>) {
        let mut log = self.log.lock().unwrap();
        log.mounted = compositions.iter().map(|c| c.frame_id().clone()).collect();
        assert!(compositions.iter().all(|c| c.ghost.is_none()));
    }

    fn unmount_all(&mut self) {
        self.log.lock().unwrap().mounted.clear();
    }

    fn capture(&mut self, frame_id: &FrameId) -> LapseResult<Vec<u8>> {
        if self.fail_on.as_ref() == Some(frame_id) {
            return Err(LapseError::rasterize(format!("capture of {frame_id} failed")));
        }
        let mut log = self.log.lock().unwrap();
        if !log.mounted.contains(frame_id) {
            return Err(LapseError::rasterize("not mounted"));
        }
        log.captured.push(frame_id.clone());
        let mut png = PNG_SIGNATURE.to_vec();
        png.extend_from_slice(frame_id.as_str().as_bytes());
        Ok(png)
    }

    fn decode_mode(&self) -> DecodeMode {
        DecodeMode::Synchronous
    }

    fn name(&self) -> &str {
        "fake"
    }
}

#[derive(Default)]
struct EngineLog {
    files: BTreeMap<String, Vec<u8>>,
    manifests: Vec<String>,
    invocations: Vec<Vec<String>>,
    written: Vec<String>,
}

/// In-memory engine that "encodes" by writing a stub output file.
struct FakeEngine {
    log: Arc<Mutex<EngineLog>>,
    fail_exec: bool,
}

impl EncodingEngine for FakeEngine {
    fn write_file(&mut self, name: &str, bytes: &[u8]) -> LapseResult<()> {
        let mut log = self.log.lock().unwrap();
        log.written.push(name.to_string());
        log.files.insert(name.to_string(), bytes.to_vec());
        Ok(())
    }

    fn read_file(&self, name: &str) -> LapseResult<Vec<u8>> {
        self.log
            .lock()
            .unwrap()
            .files
            .get(name)
            .cloned()
            .ok_or_else(|| LapseError::encode(format!("{name} missing")))
    }

    fn delete_file(&mut self, name: &str) -> LapseResult<()> {
        self.log.lock().unwrap().files.remove(name);
        Ok(())
    }

    fn list_files(&self) -> LapseResult<Vec<String>> {
        Ok(self.log.lock().unwrap().files.keys().cloned().collect())
    }

    fn exec(&mut self, args: &[String]) -> LapseResult<()> {
        let mut log = self.log.lock().unwrap();
        log.invocations.push(args.to_vec());
        let manifest = String::from_utf8(log.files["input.txt"].clone()).unwrap();
        log.manifests.push(manifest);
        if self.fail_exec {
            return Err(LapseError::encode("encoder exited with status 1"));
        }
        log.files.insert("output.mp4".to_string(), b"mp4-bytes".to_vec());
        Ok(())
    }

    fn name(&self) -> &str {
        "fake"
    }
}

struct Harness {
    store: Arc<MemoryStore>,
    project_id: ProjectId,
    frame_ids: Vec<FrameId>,
    surface_log: Arc<Mutex<SurfaceLog>>,
    engine_log: Arc<Mutex<EngineLog>>,
}

impl Harness {
    fn new(frame_count: usize) -> Self {
        let store = Arc::new(MemoryStore::new());
        let project = store.create_project("Pipeline").unwrap();
        let frame_ids = (0..frame_count)
            .map(|i| {
                store
                    .add_frame(&project.id, Frame::new(ImageSource::inline(vec![i as u8])))
                    .unwrap()
            })
            .collect();
        Self {
            store,
            project_id: project.id,
            frame_ids,
            surface_log: Arc::default(),
            engine_log: Arc::default(),
        }
    }

    fn orchestrator(
        &self,
        fail_on: Option<FrameId>,
        fail_exec: bool,
    ) -> ExportOrchestrator<FakeSurface, FakeEngine> {
        ExportOrchestrator::new(
            self.store.clone(),
            FakeSurface {
                log: self.surface_log.clone(),
                fail_on,
            },
            FakeEngine {
                log: self.engine_log.clone(),
                fail_exec,
            },
        )
    }
}

#[tokio::test]
async fn hidden_frames_are_left_out_in_order() {
    let h = Harness::new(3);
    h.store
        .set_hidden(&h.project_id, &h.frame_ids[1], true)
        .unwrap();

    let orchestrator = h.orchestrator(None, false);
    orchestrator
        .run_export(&h.project_id, PlaybackSpeed::X1)
        .await
        .unwrap();

    let surface = h.surface_log.lock().unwrap();
    assert_eq!(
        surface.captured,
        vec![h.frame_ids[0].clone(), h.frame_ids[2].clone()]
    );

    let engine = h.engine_log.lock().unwrap();
    assert_eq!(
        engine.manifests[0],
        "file 'frame-0.png'\nduration 1\nfile 'frame-1.png'\nduration 1\nfile 'frame-1.png'"
    );
}

#[tokio::test]
async fn manifest_has_one_pair_per_frame_at_2x() {
    let h = Harness::new(3);
    let orchestrator = h.orchestrator(None, false);
    orchestrator
        .run_export(&h.project_id, PlaybackSpeed::X2)
        .await
        .unwrap();

    let engine = h.engine_log.lock().unwrap();
    let manifest = &engine.manifests[0];
    let durations: Vec<_> = manifest.lines().filter(|l| l.starts_with("duration")).collect();
    assert_eq!(durations, vec!["duration 0.5"; 3]);
    for i in 0..3 {
        assert!(manifest.contains(&format!("file 'frame-{i}.png'\nduration 0.5")));
    }
}

#[tokio::test]
async fn two_identity_frames_export_one_mp4() {
    let h = Harness::new(2);
    let progress: Arc<Mutex<Vec<ExportProgress>>> = Arc::default();
    let sink = progress.clone();

    let orchestrator = h
        .orchestrator(None, false)
        .with_progress(Box::new(move |p| sink.lock().unwrap().push(p)));
    let artifact = orchestrator
        .run_export(&h.project_id, PlaybackSpeed::X1)
        .await
        .unwrap();

    assert_eq!(artifact.mime, "video/mp4");
    assert_eq!(artifact.file_name, "timelapse.mp4");
    assert_eq!(artifact.bytes, b"mp4-bytes");

    let engine = h.engine_log.lock().unwrap();
    assert_eq!(engine.invocations.len(), 1);
    let args = engine.invocations[0].join(" ");
    assert!(args.contains("-r 24"));
    assert!(args.contains("scale=400:532:force_original_aspect_ratio=decrease,pad=400:532"));
    assert!(engine.files.is_empty(), "leftover files: {:?}", engine.files.keys());

    assert_eq!(orchestrator.state(), ExportState::Idle);
    assert_eq!(orchestrator.last_outcome(), Some(ExportState::Done));

    let stages: Vec<_> = progress.lock().unwrap().iter().map(|p| p.stage).collect();
    assert_eq!(stages.first(), Some(&ExportState::Capturing));
    assert_eq!(stages.last(), Some(&ExportState::Done));
    assert!(stages.contains(&ExportState::Encoding));
}

#[tokio::test]
async fn capture_failure_never_reaches_the_assembler() {
    let h = Harness::new(3);
    let orchestrator = h.orchestrator(Some(h.frame_ids[1].clone()), false);

    let err = orchestrator
        .run_export(&h.project_id, PlaybackSpeed::X1)
        .await
        .unwrap_err();
    assert!(err.is_rasterize());

    let engine = h.engine_log.lock().unwrap();
    assert!(engine.invocations.is_empty());
    assert!(engine.written.is_empty());
    assert_eq!(orchestrator.last_outcome(), Some(ExportState::Failed));
    assert_eq!(orchestrator.state(), ExportState::Idle);
    assert!(h.surface_log.lock().unwrap().mounted.is_empty());
}

#[tokio::test]
async fn failure_report_keeps_progress_counts() {
    let h = Harness::new(3);
    let progress: Arc<Mutex<Vec<ExportProgress>>> = Arc::default();
    let sink = progress.clone();
    let orchestrator = h
        .orchestrator(Some(h.frame_ids[1].clone()), false)
        .with_progress(Box::new(move |p| sink.lock().unwrap().push(p)));

    orchestrator
        .run_export(&h.project_id, PlaybackSpeed::X1)
        .await
        .unwrap_err();

    let last = *progress.lock().unwrap().last().unwrap();
    assert_eq!(
        last,
        ExportProgress {
            stage: ExportState::Failed,
            frames_captured: 1,
            total_frames: 3,
        }
    );
}

#[tokio::test]
async fn encoder_failure_still_cleans_up() {
    let h = Harness::new(2);
    let orchestrator = h.orchestrator(None, true);

    let err = orchestrator
        .run_export(&h.project_id, PlaybackSpeed::X3)
        .await
        .unwrap_err();
    assert!(err.is_encode());

    let engine = h.engine_log.lock().unwrap();
    assert_eq!(engine.invocations.len(), 1);
    assert!(engine.files.is_empty(), "leftover files: {:?}", engine.files.keys());
    assert_eq!(orchestrator.last_outcome(), Some(ExportState::Failed));
}

#[tokio::test]
async fn concurrent_request_is_rejected() {
    let h = Harness::new(2);
    let orchestrator = h.orchestrator(None, false);

    let (first, second) = tokio::join!(
        orchestrator.run_export(&h.project_id, PlaybackSpeed::X1),
        orchestrator.run_export(&h.project_id, PlaybackSpeed::X1),
    );
    assert!(first.is_ok());
    assert!(matches!(second, Err(LapseError::ExportInProgress)));
    assert_eq!(h.engine_log.lock().unwrap().invocations.len(), 1);

    // Free again once the first job finished.
    orchestrator
        .run_export(&h.project_id, PlaybackSpeed::X1)
        .await
        .unwrap();
}

#[tokio::test]
async fn nothing_visible_is_rejected() {
    let h = Harness::new(1);
    h.store
        .set_hidden(&h.project_id, &h.frame_ids[0], true)
        .unwrap();

    let orchestrator = h.orchestrator(None, false);
    let err = orchestrator
        .run_export(&h.project_id, PlaybackSpeed::X1)
        .await
        .unwrap_err();
    assert!(matches!(err, LapseError::NothingToExport { .. }));
    assert!(h.engine_log.lock().unwrap().written.is_empty());
}

#[tokio::test]
async fn export_never_touches_stored_frames() {
    let h = Harness::new(3);
    let before = h.store.list_frames(&h.project_id).unwrap();

    let ok = h.orchestrator(None, false);
    ok.run_export(&h.project_id, PlaybackSpeed::X4).await.unwrap();
    let failing = h.orchestrator(Some(h.frame_ids[2].clone()), false);
    failing
        .run_export(&h.project_id, PlaybackSpeed::X4)
        .await
        .unwrap_err();

    assert_eq!(h.store.list_frames(&h.project_id).unwrap(), before);
}
