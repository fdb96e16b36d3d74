//! On-disk project store.
//!
//! Layout:
//!
//! ```text
//! <root>/
//!   <project_id>/
//!     project.json
//!     frames/
//!       <frame_id>.<ext>
//! ```
//!
//! File-backed images are copied into `frames/` when added and persisted with
//! paths relative to the project directory. Reads hand out absolute paths.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::frame::{image_extension, Frame, FrameId, ImageSource, ProjectId};
use crate::project::{Project, ProjectError, PROJECT_FILE};
use crate::store::{not_found, FrameStore, ProjectStore};
use crate::transform::Transform;

/// Subdirectory holding copied frame images.
pub const FRAMES_DIR: &str = "frames";

/// Store keeping one directory per project under a root.
#[derive(Debug)]
pub struct DirectoryStore {
    root: PathBuf,
    // Serializes read-modify-write cycles on project.json.
    write_lock: Mutex<()>,
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of one project.
    pub fn project_dir(&self, project_id: &ProjectId) -> PathBuf {
        self.root.join(project_id.as_str())
    }

    fn read_project(&self, project_id: &ProjectId) -> Result<Project, ProjectError> {
        let dir = self.project_dir(project_id);
        if !dir.join(PROJECT_FILE).exists() {
            return Err(not_found(project_id));
        }
        let mut project = Project::load(&dir)?;
        for frame in &mut project.frames {
            frame.image = frame.image.resolved_against(&dir);
        }
        Ok(project)
    }

    fn write_project(&self, project: &Project) -> Result<(), ProjectError> {
        let dir = self.project_dir(&project.id);
        let mut persisted = project.clone();
        for frame in &mut persisted.frames {
            frame.image = relative_to(&frame.image, &dir);
        }
        Project::save(&persisted, &dir)
    }

    fn edit<T>(
        &self,
        project_id: &ProjectId,
        f: impl FnOnce(&mut Project) -> Result<T, ProjectError>,
    ) -> Result<T, ProjectError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut project = self.read_project(project_id)?;
        let value = f(&mut project)?;
        self.write_project(&project)?;
        Ok(value)
    }

    /// Copy an external image file into the project's `frames/` directory.
    fn import_image(
        &self,
        project_id: &ProjectId,
        frame_id: &FrameId,
        image: ImageSource,
    ) -> Result<ImageSource, ProjectError> {
        let ImageSource::File { path } = image else {
            return Ok(image);
        };
        let frames_dir = self.project_dir(project_id).join(FRAMES_DIR);
        if path.starts_with(&frames_dir) {
            return Ok(ImageSource::File { path });
        }

        std::fs::create_dir_all(&frames_dir).map_err(|e| ProjectError::IoError {
            path: frames_dir.clone(),
            source: e,
        })?;

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("img")
            .to_ascii_lowercase();
        let target = frames_dir.join(format!("{frame_id}.{extension}"));
        std::fs::copy(&path, &target).map_err(|e| ProjectError::IoError {
            path: path.clone(),
            source: e,
        })?;

        tracing::debug!(source = %path.display(), target = %target.display(), "Copied frame image");
        Ok(ImageSource::File { path: target })
    }

    /// Write encoded bytes to `frames/<frame_id>.<ext>`.
    fn write_image(
        &self,
        project_id: &ProjectId,
        frame_id: &FrameId,
        bytes: &[u8],
    ) -> Result<ImageSource, ProjectError> {
        let frames_dir = self.project_dir(project_id).join(FRAMES_DIR);
        std::fs::create_dir_all(&frames_dir).map_err(|e| ProjectError::IoError {
            path: frames_dir.clone(),
            source: e,
        })?;

        let extension = image_extension(bytes).unwrap_or("img");
        let target = frames_dir.join(format!("{frame_id}.{extension}"));
        let tmp = target.with_extension(format!("{extension}.tmp"));
        std::fs::write(&tmp, bytes)
            .and_then(|()| std::fs::rename(&tmp, &target))
            .map_err(|e| ProjectError::IoError {
                path: target.clone(),
                source: e,
            })?;
        Ok(ImageSource::File { path: target })
    }

    fn delete_copied_image(&self, project_id: &ProjectId, image: &ImageSource) {
        let frames_dir = self.project_dir(project_id).join(FRAMES_DIR);
        if let ImageSource::File { path } = image {
            if path.starts_with(&frames_dir) {
                if let Err(e) = std::fs::remove_file(path) {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to delete frame image");
                }
            }
        }
    }
}

fn relative_to(image: &ImageSource, dir: &Path) -> ImageSource {
    match image {
        ImageSource::File { path } => match path.strip_prefix(dir) {
            Ok(relative) => ImageSource::file(relative),
            Err(_) => image.clone(),
        },
        ImageSource::Inline { .. } => image.clone(),
    }
}

impl FrameStore for DirectoryStore {
    fn get_frame(&self, project_id: &ProjectId, frame_id: &FrameId) -> Result<Frame, ProjectError> {
        self.read_project(project_id)?.frame(frame_id).cloned()
    }

    fn update_frame_transform(
        &self,
        project_id: &ProjectId,
        frame_id: &FrameId,
        transform: Transform,
    ) -> Result<(), ProjectError> {
        self.edit(project_id, |project| project.set_transform(frame_id, transform))
    }

    fn list_frames(&self, project_id: &ProjectId) -> Result<Vec<Frame>, ProjectError> {
        Ok(self.read_project(project_id)?.frames)
    }
}

impl ProjectStore for DirectoryStore {
    fn create_project(&self, name: &str) -> Result<Project, ProjectError> {
        let project = Project::new(name);
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        self.write_project(&project)?;
        tracing::info!(project_id = %project.id, name = %project.name, "Created project");
        Ok(project)
    }

    fn load_project(&self, project_id: &ProjectId) -> Result<Project, ProjectError> {
        self.read_project(project_id)
    }

    fn list_projects(&self) -> Result<Vec<Project>, ProjectError> {
        if !self.root.exists() {
            return Ok(vec![]);
        }
        let entries = std::fs::read_dir(&self.root).map_err(|e| ProjectError::IoError {
            path: self.root.clone(),
            source: e,
        })?;

        let mut projects = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| ProjectError::IoError {
                path: self.root.clone(),
                source: e,
            })?;
            let path = entry.path();
            if !path.join(PROJECT_FILE).is_file() {
                continue;
            }
            match Project::load(&path) {
                Ok(project) => projects.push(project),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable project")
                }
            }
        }
        projects.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(projects)
    }

    fn add_frame(&self, project_id: &ProjectId, mut frame: Frame) -> Result<FrameId, ProjectError> {
        if !self.project_dir(project_id).join(PROJECT_FILE).exists() {
            return Err(not_found(project_id));
        }
        frame.image = self.import_image(project_id, &frame.id, frame.image)?;
        self.edit(project_id, |project| Ok(project.push_frame(frame)))
    }

    fn remove_frame(&self, project_id: &ProjectId, frame_id: &FrameId) -> Result<(), ProjectError> {
        let removed = self.edit(project_id, |project| project.remove_frame(frame_id))?;
        self.delete_copied_image(project_id, &removed.image);
        Ok(())
    }

    fn move_frame(
        &self,
        project_id: &ProjectId,
        frame_id: &FrameId,
        to_index: usize,
    ) -> Result<(), ProjectError> {
        self.edit(project_id, |project| project.move_frame(frame_id, to_index))
    }

    fn set_caption(
        &self,
        project_id: &ProjectId,
        frame_id: &FrameId,
        caption: Option<String>,
    ) -> Result<(), ProjectError> {
        self.edit(project_id, |project| {
            project.frame_mut(frame_id)?.caption = caption;
            project.touch();
            Ok(())
        })
    }

    fn set_hidden(
        &self,
        project_id: &ProjectId,
        frame_id: &FrameId,
        hidden: bool,
    ) -> Result<(), ProjectError> {
        self.edit(project_id, |project| {
            project.frame_mut(frame_id)?.hidden = hidden;
            project.touch();
            Ok(())
        })
    }

    fn replace_image(
        &self,
        project_id: &ProjectId,
        frame_id: &FrameId,
        image: ImageSource,
    ) -> Result<(), ProjectError> {
        self.read_project(project_id)?.frame(frame_id)?;
        let image = match image {
            ImageSource::Inline { data } => self.write_image(project_id, frame_id, &data)?,
            file => self.import_image(project_id, frame_id, file)?,
        };

        let previous = self.edit(project_id, |project| {
            let frame = project.frame_mut(frame_id)?;
            let previous = std::mem::replace(&mut frame.image, image.clone());
            project.touch();
            Ok(previous)
        })?;
        if previous != image {
            self.delete_copied_image(project_id, &previous);
        }
        tracing::debug!(project_id = %project_id, frame_id = %frame_id, "Replaced frame image");
        Ok(())
    }

    fn save_project(&self, project: &Project) -> Result<(), ProjectError> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        self.write_project(project)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_frame_copies_image_and_persists_relative_path() {
        let root = tempfile::tempdir().unwrap();
        let source_dir = tempfile::tempdir().unwrap();
        let source = source_dir.path().join("IMG_0001.JPG");
        std::fs::write(&source, b"jpeg").unwrap();

        let store = DirectoryStore::new(root.path());
        let project = store.create_project("Sunflowers").unwrap();
        let frame_id = store
            .add_frame(&project.id, Frame::new(ImageSource::file(&source)))
            .unwrap();

        let raw = std::fs::read_to_string(store.project_dir(&project.id).join(PROJECT_FILE)).unwrap();
        assert!(raw.contains(&format!("frames/{frame_id}.jpg")));

        let frame = store.get_frame(&project.id, &frame_id).unwrap();
        assert_eq!(frame.image.read_bytes().unwrap(), b"jpeg");
    }

    #[test]
    fn test_transform_survives_reopen() {
        let root = tempfile::tempdir().unwrap();
        let store = DirectoryStore::new(root.path());
        let project = store.create_project("Sunflowers").unwrap();
        let frame_id = store
            .add_frame(&project.id, Frame::new(ImageSource::inline(vec![7])))
            .unwrap();
        store
            .update_frame_transform(&project.id, &frame_id, Transform::new(-0.5, 0.25, 2.0, 90.0))
            .unwrap();

        let reopened = DirectoryStore::new(root.path());
        let frame = reopened.get_frame(&project.id, &frame_id).unwrap();
        assert_eq!(frame.transform, Transform::new(-0.5, 0.25, 2.0, 90.0));
    }

    #[test]
    fn test_list_projects() {
        let root = tempfile::tempdir().unwrap();
        let store = DirectoryStore::new(root.path());
        assert!(store.list_projects().unwrap().is_empty());

        store.create_project("One").unwrap();
        store.create_project("Two").unwrap();
        std::fs::create_dir_all(root.path().join("stray")).unwrap();

        assert_eq!(store.list_projects().unwrap().len(), 2);
    }

    #[test]
    fn test_missing_project_is_not_found() {
        let root = tempfile::tempdir().unwrap();
        let store = DirectoryStore::new(root.path());
        let err = store.load_project(&ProjectId::from("nope")).unwrap_err();
        assert!(matches!(err, ProjectError::ProjectNotFound { .. }));
    }

    #[test]
    fn test_remove_frame_deletes_copied_image() {
        let root = tempfile::tempdir().unwrap();
        let source_dir = tempfile::tempdir().unwrap();
        let source = source_dir.path().join("a.png");
        std::fs::write(&source, b"png").unwrap();

        let store = DirectoryStore::new(root.path());
        let project = store.create_project("Sunflowers").unwrap();
        let frame_id = store
            .add_frame(&project.id, Frame::new(ImageSource::file(&source)))
            .unwrap();
        let copied = store
            .project_dir(&project.id)
            .join(FRAMES_DIR)
            .join(format!("{frame_id}.png"));
        assert!(copied.exists());

        store.remove_frame(&project.id, &frame_id).unwrap();
        assert!(!copied.exists());
        assert!(source.exists());
    }

    #[test]
    fn test_replace_image_swaps_copied_file() {
        let root = tempfile::tempdir().unwrap();
        let source_dir = tempfile::tempdir().unwrap();
        let source = source_dir.path().join("a.png");
        std::fs::write(&source, [0x89, b'P', b'N', b'G']).unwrap();

        let store = DirectoryStore::new(root.path());
        let project = store.create_project("Sunflowers").unwrap();
        let frame_id = store
            .add_frame(&project.id, Frame::new(ImageSource::file(&source)))
            .unwrap();
        let frames_dir = store.project_dir(&project.id).join(FRAMES_DIR);
        let old = frames_dir.join(format!("{frame_id}.png"));
        assert!(old.exists());

        let jpeg = vec![0xFF, 0xD8, 0xFF, 0xE0, 1, 2];
        store
            .replace_image(&project.id, &frame_id, ImageSource::inline(jpeg.clone()))
            .unwrap();

        let new = frames_dir.join(format!("{frame_id}.jpg"));
        assert!(new.exists());
        assert!(!old.exists());
        let raw = std::fs::read_to_string(store.project_dir(&project.id).join(PROJECT_FILE)).unwrap();
        assert!(raw.contains(&format!("frames/{frame_id}.jpg")));

        let frame = DirectoryStore::new(root.path())
            .get_frame(&project.id, &frame_id)
            .unwrap();
        assert_eq!(frame.image.read_bytes().unwrap(), jpeg);
    }
}
