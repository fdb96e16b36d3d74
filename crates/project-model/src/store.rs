//! Frame and project stores.
//!
//! [`FrameStore`] is the narrow interface the alignment controller and the
//! export pipeline depend on. [`ProjectStore`] adds the editing operations
//! used by front ends.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::frame::{Frame, FrameId, ImageSource, ProjectId};
use crate::project::{Project, ProjectError};
use crate::transform::Transform;

/// Per-frame reads and transform writes.
pub trait FrameStore: Send + Sync {
    fn get_frame(&self, project_id: &ProjectId, frame_id: &FrameId) -> Result<Frame, ProjectError>;

    /// Replace a frame's transform in one update.
    fn update_frame_transform(
        &self,
        project_id: &ProjectId,
        frame_id: &FrameId,
        transform: Transform,
    ) -> Result<(), ProjectError>;

    /// All frames of a project in sequence order, hidden ones included.
    fn list_frames(&self, project_id: &ProjectId) -> Result<Vec<Frame>, ProjectError>;
}

/// Full project editing surface.
pub trait ProjectStore: FrameStore {
    fn create_project(&self, name: &str) -> Result<Project, ProjectError>;

    fn load_project(&self, project_id: &ProjectId) -> Result<Project, ProjectError>;

    fn list_projects(&self) -> Result<Vec<Project>, ProjectError>;

    /// Append a frame and return its id.
    fn add_frame(&self, project_id: &ProjectId, frame: Frame) -> Result<FrameId, ProjectError>;

    fn remove_frame(&self, project_id: &ProjectId, frame_id: &FrameId) -> Result<(), ProjectError>;

    fn move_frame(
        &self,
        project_id: &ProjectId,
        frame_id: &FrameId,
        to_index: usize,
    ) -> Result<(), ProjectError>;

    fn set_caption(
        &self,
        project_id: &ProjectId,
        frame_id: &FrameId,
        caption: Option<String>,
    ) -> Result<(), ProjectError>;

    fn set_hidden(
        &self,
        project_id: &ProjectId,
        frame_id: &FrameId,
        hidden: bool,
    ) -> Result<(), ProjectError>;

    /// Swap a frame's image, keeping its transform, caption and visibility.
    fn replace_image(
        &self,
        project_id: &ProjectId,
        frame_id: &FrameId,
        image: ImageSource,
    ) -> Result<(), ProjectError>;

    /// Insert or replace a whole project.
    fn save_project(&self, project: &Project) -> Result<(), ProjectError>;
}

/// In-process store for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryStore {
    projects: RwLock<HashMap<ProjectId, Project>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with one project.
    pub fn with_project(project: Project) -> Self {
        let store = Self::new();
        store.write().insert(project.id.clone(), project);
        store
    }

    // A poisoned lock only means another thread panicked mid-update; the map
    // itself is still structurally valid.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<ProjectId, Project>> {
        self.projects.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<ProjectId, Project>> {
        self.projects.write().unwrap_or_else(|e| e.into_inner())
    }

    fn edit<T>(
        &self,
        project_id: &ProjectId,
        f: impl FnOnce(&mut Project) -> Result<T, ProjectError>,
    ) -> Result<T, ProjectError> {
        let mut projects = self.write();
        let project = projects
            .get_mut(project_id)
            .ok_or_else(|| not_found(project_id))?;
        f(project)
    }
}

pub(crate) fn not_found(project_id: &ProjectId) -> ProjectError {
    ProjectError::ProjectNotFound {
        project_id: project_id.clone(),
    }
}

impl FrameStore for MemoryStore {
    fn get_frame(&self, project_id: &ProjectId, frame_id: &FrameId) -> Result<Frame, ProjectError> {
        let projects = self.read();
        let project = projects.get(project_id).ok_or_else(|| not_found(project_id))?;
        project.frame(frame_id).cloned()
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
        let projects = self.read();
        let project = projects.get(project_id).ok_or_else(|| not_found(project_id))?;
        Ok(project.frames.clone())
    }
}

impl ProjectStore for MemoryStore {
    fn create_project(&self, name: &str) -> Result<Project, ProjectError> {
        let project = Project::new(name);
        self.write().insert(project.id.clone(), project.clone());
        Ok(project)
    }

    fn load_project(&self, project_id: &ProjectId) -> Result<Project, ProjectError> {
        self.read()
            .get(project_id)
            .cloned()
            .ok_or_else(|| not_found(project_id))
    }

    fn list_projects(&self) -> Result<Vec<Project>, ProjectError> {
        let mut projects: Vec<Project> = self.read().values().cloned().collect();
        projects.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(projects)
    }

    fn add_frame(&self, project_id: &ProjectId, frame: Frame) -> Result<FrameId, ProjectError> {
        self.edit(project_id, |project| Ok(project.push_frame(frame)))
    }

    fn remove_frame(&self, project_id: &ProjectId, frame_id: &FrameId) -> Result<(), ProjectError> {
        self.edit(project_id, |project| project.remove_frame(frame_id).map(|_| ()))
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
        self.edit(project_id, |project| {
            project.frame_mut(frame_id)?.image = image;
            project.touch();
            Ok(())
        })
    }

    fn save_project(&self, project: &Project) -> Result<(), ProjectError> {
        self.write().insert(project.id.clone(), project.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(byte: u8) -> Frame {
        Frame::new(ImageSource::inline(vec![byte]))
    }

    #[test]
    fn test_update_transform_is_visible_to_readers() {
        let store = MemoryStore::new();
        let project = store.create_project("Tomatoes").unwrap();
        let id = store.add_frame(&project.id, frame(1)).unwrap();

        let moved = Transform::new(0.2, 0.1, 1.3, -4.0);
        store.update_frame_transform(&project.id, &id, moved).unwrap();

        assert_eq!(store.get_frame(&project.id, &id).unwrap().transform, moved);
    }

    #[test]
    fn test_list_frames_keeps_order_and_hidden() {
        let store = MemoryStore::new();
        let project = store.create_project("Tomatoes").unwrap();
        let a = store.add_frame(&project.id, frame(1)).unwrap();
        let b = store.add_frame(&project.id, frame(2)).unwrap();
        store.set_hidden(&project.id, &b, true).unwrap();

        let frames = store.list_frames(&project.id).unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].id, a);
        assert!(frames[1].hidden);
    }

    #[test]
    fn test_unknown_project() {
        let store = MemoryStore::new();
        let err = store.list_frames(&ProjectId::from("missing")).unwrap_err();
        assert!(matches!(err, ProjectError::ProjectNotFound { .. }));
    }

    #[test]
    fn test_caption_and_remove() {
        let store = MemoryStore::new();
        let project = store.create_project("Tomatoes").unwrap();
        let a = store.add_frame(&project.id, frame(1)).unwrap();
        store
            .set_caption(&project.id, &a, Some("Week 1".into()))
            .unwrap();
        assert_eq!(
            store.get_frame(&project.id, &a).unwrap().caption.as_deref(),
            Some("Week 1")
        );

        store.remove_frame(&project.id, &a).unwrap();
        assert!(store.list_frames(&project.id).unwrap().is_empty());
    }

    #[test]
    fn test_replace_image_keeps_alignment() {
        let store = MemoryStore::new();
        let project = store.create_project("Tomatoes").unwrap();
        let a = store.add_frame(&project.id, frame(1)).unwrap();
        let moved = Transform::new(0.1, 0.0, 1.5, 12.0);
        store.update_frame_transform(&project.id, &a, moved).unwrap();

        store
            .replace_image(&project.id, &a, ImageSource::inline(vec![9, 9]))
            .unwrap();

        let frame = store.get_frame(&project.id, &a).unwrap();
        assert_eq!(frame.image, ImageSource::inline(vec![9, 9]));
        assert_eq!(frame.transform, moved);
        assert!(matches!(
            store.replace_image(&project.id, &FrameId::from("gone"), ImageSource::inline(vec![])),
            Err(ProjectError::FrameNotFound { .. })
        ));
    }
}
