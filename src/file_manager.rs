//! The open file, the saved-file list and the theme.
//!
//! Saving and deleting update the in-memory list first and then call the
//! store. A store failure is returned to the caller but the optimistic update
//! stays in place and the diagram is never rolled back.

use crate::constants::{DOCUMENT_EXTENSION, UNTITLED_FILE_NAME};
use crate::diagram::DiagramController;
use crate::document::{DiagramDocument, read_document};
use crate::error::{FileError, FileResult, StoreError};
use crate::settings::{Settings, Theme};
use crate::store::{DocumentStore, FileInfo, SavedFile, now_millis};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::UNIX_EPOCH;
use tracing::{info, warn};

fn new_file_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

pub struct FileManager {
    store: Arc<dyn DocumentStore>,
    current_file: Option<FileInfo>,
    saved_files: Vec<SavedFile>,
    theme: Theme,
    /// Where the theme is persisted; `None` keeps it in memory only
    settings_path: Option<PathBuf>,
}

impl FileManager {
    pub fn new(store: Arc<dyn DocumentStore>, theme: Theme) -> Self {
        Self {
            store,
            current_file: None,
            saved_files: Vec::new(),
            theme,
            settings_path: None,
        }
    }

    pub fn with_settings_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings_path = Some(path.into());
        self
    }

    pub fn current_file(&self) -> Option<&FileInfo> {
        self.current_file.as_ref()
    }

    pub fn saved_files(&self) -> &[SavedFile] {
        &self.saved_files
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    /// Refresh the saved list from the store. Failures leave an empty list.
    pub fn refresh_saved_files(&mut self) {
        self.saved_files = self.store.list_or_empty();
    }

    /// Start an empty, unsaved diagram.
    pub fn create_new_file(&mut self, controller: &mut DiagramController) {
        controller.clear_diagram();
        self.current_file = Some(FileInfo {
            id: new_file_id(),
            name: UNTITLED_FILE_NAME.to_string(),
            last_modified: now_millis(),
        });
    }

    /// Import a document file. The diagram is replaced only if the file
    /// parses and has both arrays; the import gets a fresh id.
    pub fn open_file(&mut self, controller: &mut DiagramController, path: &Path) -> FileResult<()> {
        let document = read_document(path)?;
        document.load_into(controller);

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.replacen(".json", "", 1))
            .unwrap_or_else(|| UNTITLED_FILE_NAME.to_string());
        let last_modified = std::fs::metadata(path)
            .and_then(|m| m.modified())
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_millis() as u64)
            .unwrap_or_else(now_millis);

        info!(path = %path.display(), %name, "Opened diagram file");
        self.current_file = Some(FileInfo {
            id: new_file_id(),
            name,
            last_modified,
        });
        Ok(())
    }

    pub fn load_saved_file(&mut self, controller: &mut DiagramController, file: &SavedFile) {
        file.data.clone().load_into(controller);
        self.current_file = Some(file.info.clone());
    }

    /// Load a saved file by id from the current list.
    pub fn load_saved_file_by_id(
        &mut self,
        controller: &mut DiagramController,
        id: &str,
    ) -> FileResult<()> {
        let file = self
            .saved_files
            .iter()
            .find(|f| f.id == id)
            .cloned()
            .ok_or_else(|| FileError::Store(StoreError::NotFound(id.to_string())))?;
        self.load_saved_file(controller, &file);
        Ok(())
    }

    /// Save the current diagram under the open file.
    pub fn save(&mut self, controller: &DiagramController) -> FileResult<()> {
        let current = self.current_file.as_mut().ok_or(FileError::NoOpenFile)?;
        current.last_modified = now_millis();

        let saved = SavedFile::new(current.clone(), DiagramDocument::from_controller(controller));
        match self.saved_files.iter_mut().find(|f| f.id == saved.id) {
            Some(existing) => *existing = saved.clone(),
            None => self.saved_files.insert(0, saved.clone()),
        }

        self.store.save_file(&saved)?;
        info!(id = %saved.id, name = %saved.info.name, "Saved diagram");
        Ok(())
    }

    /// Export the diagram as `<name>.json` into `dir`.
    pub fn download_json(&self, controller: &DiagramController, dir: &Path) -> FileResult<PathBuf> {
        let current = self.current_file.as_ref().ok_or(FileError::NoOpenFile)?;
        let path = dir.join(format!("{}.{DOCUMENT_EXTENSION}", current.name));
        DiagramDocument::from_controller(controller).write_to(&path)?;
        Ok(path)
    }

    pub fn rename_file(&mut self, new_name: &str) -> FileResult<()> {
        let name = new_name.trim();
        if name.is_empty() {
            return Err(FileError::EmptyName);
        }
        let current = self.current_file.as_mut().ok_or(FileError::NoOpenFile)?;
        current.name = name.to_string();
        Ok(())
    }

    pub fn close_file(&mut self, controller: &mut DiagramController) {
        controller.clear_diagram();
        self.current_file = None;
    }

    /// Remove a saved file from the list, then from the store.
    pub fn delete_saved_file(&mut self, id: &str) -> FileResult<()> {
        self.saved_files.retain(|f| f.id != id);
        self.store.delete_file(id)?;
        Ok(())
    }

    /// Flip light/dark and persist it.
    pub fn toggle_theme(&mut self) -> Theme {
        self.theme = self.theme.toggled();
        if let Some(path) = &self.settings_path {
            let mut settings = Settings::load_or_default(path);
            settings.theme = self.theme;
            if let Err(e) = settings.save_to(path) {
                warn!(error = %e, "Failed to persist theme");
            }
        }
        self.theme
    }
}
