//! The editor: one diagram, its view and every input source.
//!
//! `Editor` is the single logical writer. Pointer handlers, the gesture
//! session and file operations all reach the diagram through its controller,
//! one call at a time; if pointer and gesture input interleave, the last
//! write wins. Failures from files, the store or the gesture link become
//! toasts here instead of propagating further.

use crate::diagram::DiagramController;
use crate::error::LinkResult;
use crate::file_manager::FileManager;
use crate::gesture::{FrameSource, GestureAction, GestureConfig, GestureLink, GestureSession, GestureView};
use crate::notifications::{Toast, ToastManager};
use crate::pointer::{PointerInput, PointerTarget};
use crate::settings::Settings;
use crate::store::DocumentStore;
use crate::types::{NodeId, ScreenPoint};
use crate::viewport::{SurfaceRect, ViewportTransform};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

pub struct Editor {
    controller: DiagramController,
    viewport: ViewportTransform,
    surface: SurfaceRect,
    screen_width: f64,
    screen_height: f64,
    pointer: PointerInput,
    gesture_config: GestureConfig,
    gestures: Option<GestureSession>,
    files: FileManager,
    toasts: ToastManager,
}

impl Editor {
    /// Editor whose surface fills a screen of the given size.
    pub fn new(store: Arc<dyn DocumentStore>, settings: &Settings, screen_width: f64, screen_height: f64) -> Self {
        Self {
            controller: DiagramController::new(),
            viewport: ViewportTransform::default(),
            surface: SurfaceRect::at_origin(screen_width, screen_height),
            screen_width,
            screen_height,
            pointer: PointerInput::new(),
            gesture_config: settings.gesture.clone(),
            gestures: None,
            files: FileManager::new(store, settings.theme),
            toasts: ToastManager::new(),
        }
    }

    pub fn with_files(mut self, files: FileManager) -> Self {
        self.files = files;
        self
    }

    pub fn controller(&self) -> &DiagramController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut DiagramController {
        &mut self.controller
    }

    pub fn viewport(&self) -> &ViewportTransform {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut ViewportTransform {
        &mut self.viewport
    }

    pub fn surface(&self) -> &SurfaceRect {
        &self.surface
    }

    /// The surface moved or resized (layout change).
    pub fn set_surface(&mut self, surface: SurfaceRect) {
        self.surface = surface;
    }

    pub fn set_screen_size(&mut self, width: f64, height: f64) {
        self.screen_width = width;
        self.screen_height = height;
    }

    pub fn files(&self) -> &FileManager {
        &self.files
    }

    pub fn toasts(&self) -> &ToastManager {
        &self.toasts
    }

    pub fn toasts_mut(&mut self) -> &mut ToastManager {
        &mut self.toasts
    }

    pub fn pointer(&self) -> &PointerInput {
        &self.pointer
    }

    /// View parameters for the next gesture sample, read now.
    pub fn gesture_view(&self) -> GestureView {
        GestureView {
            screen_width: self.screen_width,
            screen_height: self.screen_height,
            surface: self.surface,
            viewport: self.viewport,
        }
    }

    // ==================== Gestures ====================

    pub fn gestures(&self) -> Option<&GestureSession> {
        self.gestures.as_ref()
    }

    pub fn gestures_enabled(&self) -> bool {
        self.gestures.as_ref().is_some_and(GestureSession::is_enabled)
    }

    /// Start gesture input over `link`, replacing any previous session.
    pub fn enable_gestures(&mut self, link: Box<dyn GestureLink>) -> LinkResult<()> {
        self.disable_gestures();
        let mut session = GestureSession::new(
            link,
            self.gesture_config.clone(),
            self.screen_width,
            self.screen_height,
        );
        let result = session.enable();
        self.collect_session_toasts(&mut session);
        if result.is_ok() {
            self.gestures = Some(session);
        }
        result
    }

    /// Stop gesture input. The diagram, including an armed connection, is
    /// left untouched.
    pub fn disable_gestures(&mut self) {
        if let Some(mut session) = self.gestures.take() {
            session.disable();
            self.collect_session_toasts(&mut session);
        }
    }

    /// Dispatch every pending gesture event.
    pub fn pump_gestures(&mut self, now: Instant) -> Vec<GestureAction> {
        let view = self.gesture_view();
        let Some(session) = self.gestures.as_mut() else {
            return Vec::new();
        };
        let actions = session.pump(&mut self.controller, &view, now);
        for toast in session.drain_notifications() {
            self.toasts.push(toast);
        }
        actions
    }

    pub fn tick_frames(&mut self, now: Instant, source: &mut dyn FrameSource) -> bool {
        self.gestures
            .as_mut()
            .is_some_and(|session| session.tick_frames(now, source))
    }

    fn collect_session_toasts(&mut self, session: &mut GestureSession) {
        for toast in session.drain_notifications() {
            self.toasts.push(toast);
        }
    }

    // ==================== Pointer ====================

    pub fn pointer_down(&mut self, screen: ScreenPoint) -> PointerTarget {
        self.pointer
            .button_down(screen, &self.surface, &self.viewport, &mut self.controller)
    }

    pub fn pointer_move(&mut self, screen: ScreenPoint) -> bool {
        self.pointer
            .pointer_move(screen, &self.surface, &mut self.viewport, &mut self.controller)
    }

    pub fn pointer_up(&mut self) {
        self.pointer.button_up();
    }

    pub fn wheel(&mut self, screen: ScreenPoint, wheel_delta_y: f64) -> bool {
        self.pointer
            .wheel(screen, wheel_delta_y, &self.surface, &mut self.viewport)
    }

    // ==================== Commands ====================

    /// Delete the selected node, or else the selected connection.
    pub fn delete_selection(&mut self) -> bool {
        let model = self.controller.model();
        let node = model.selected_node_id().cloned();
        let connection = model.selected_connection_id().cloned();

        if let Some(id) = node {
            self.controller.delete_node(&id);
            self.toasts.push(Toast::info("Node deleted"));
            true
        } else if let Some(id) = connection {
            self.controller.delete_connection(&id);
            self.toasts.push(Toast::info("Connection removed"));
            true
        } else {
            false
        }
    }

    /// Commit an edited label.
    pub fn rename_node(&mut self, id: &NodeId, label: &str) {
        self.controller.update_node_label(id, label);
    }

    // ==================== Files ====================

    pub fn refresh_saved_files(&mut self) {
        self.files.refresh_saved_files();
    }

    pub fn create_new_file(&mut self) {
        self.files.create_new_file(&mut self.controller);
        self.viewport.reset();
    }

    pub fn open_file(&mut self, path: &Path) -> bool {
        match self.files.open_file(&mut self.controller, path) {
            Ok(()) => true,
            Err(e) => {
                error!(path = %path.display(), error = %e, "Failed to open file");
                self.toasts.push(Toast::error(e.to_string()));
                false
            }
        }
    }

    pub fn load_saved_file(&mut self, id: &str) -> bool {
        match self.files.load_saved_file_by_id(&mut self.controller, id) {
            Ok(()) => true,
            Err(e) => {
                self.toasts.push(Toast::error(e.to_string()));
                false
            }
        }
    }

    pub fn save(&mut self) -> bool {
        match self.files.save(&self.controller) {
            Ok(()) => {
                self.toasts.push(Toast::success("Diagram saved successfully"));
                true
            }
            Err(e) => {
                error!(error = %e, "Save failed");
                self.toasts.push(Toast::error("Failed to save diagram"));
                false
            }
        }
    }

    pub fn download_json(&mut self, dir: &Path) -> Option<PathBuf> {
        match self.files.download_json(&self.controller, dir) {
            Ok(path) => {
                info!(path = %path.display(), "Exported diagram");
                self.toasts.push(Toast::success("JSON downloaded"));
                Some(path)
            }
            Err(e) => {
                error!(error = %e, "Download failed");
                self.toasts.push(Toast::error("Download failed"));
                None
            }
        }
    }

    pub fn rename_file(&mut self, name: &str) -> bool {
        match self.files.rename_file(name) {
            Ok(()) => true,
            Err(e) => {
                self.toasts.push(Toast::warning(e.to_string()));
                false
            }
        }
    }

    pub fn close_file(&mut self) {
        self.files.close_file(&mut self.controller);
    }

    pub fn delete_saved_file(&mut self, id: &str) -> bool {
        match self.files.delete_saved_file(id) {
            Ok(()) => true,
            Err(e) => {
                error!(id, error = %e, "Delete failed");
                self.toasts.push(Toast::error("Failed to delete file"));
                false
            }
        }
    }

    pub fn toggle_theme(&mut self) {
        self.files.toggle_theme();
    }
}
