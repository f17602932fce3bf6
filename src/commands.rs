use std::path::PathBuf;
use std::sync::Arc;

use tauri::{AppHandle, Manager, State, Wry};
use tauri_plugin_dialog::{DialogExt, MessageDialogButtons, MessageDialogKind};
use tokio::sync::RwLock;

use crate::controller::{Dispatched, Intent, SessionController, UserPrompt};
use crate::display::SessionSnapshot;
use crate::links::embed_url;
use crate::persistence::TauriStore;
use crate::roster::{load_roster_file, RosterLoad, RosterOrigin};

pub type SharedController = Arc<RwLock<SessionController<TauriStore<Wry>>>>;

/// Confirmations and alerts shown as native message dialogs.
///
/// Dispatch holds the controller lock while a dialog is open. Each dialog runs
/// under `block_in_place`, which moves this worker's queued tasks to other
/// runtime threads for the duration.
struct DialogPrompt<'a> {
    app_handle: &'a AppHandle,
}

impl UserPrompt for DialogPrompt<'_> {
    fn confirm(&mut self, message: &str) -> bool {
        tokio::task::block_in_place(|| {
            self.app_handle
                .dialog()
                .message(message)
                .kind(MessageDialogKind::Warning)
                .buttons(MessageDialogButtons::OkCancel)
                .blocking_show()
        })
    }

    fn alert(&mut self, message: &str) {
        tokio::task::block_in_place(|| {
            self.app_handle
                .dialog()
                .message(message)
                .kind(MessageDialogKind::Info)
                .blocking_show()
        });
    }
}

#[tauri::command]
pub async fn get_session(state: State<'_, SharedController>) -> Result<SessionSnapshot, String> {
    Ok(state.read().await.snapshot())
}

#[tauri::command]
pub async fn dispatch_intent(
    app_handle: AppHandle,
    state: State<'_, SharedController>,
    intent: Intent,
) -> Result<Dispatched, String> {
    let mut prompt = DialogPrompt {
        app_handle: &app_handle,
    };
    let mut controller = state.write().await;
    controller
        .dispatch(intent, &mut prompt)
        .map_err(|error| error.to_string())
}

#[tauri::command]
pub async fn video_embed_url(
    state: State<'_, SharedController>,
    origin: Option<String>,
) -> Result<Option<String>, String> {
    let controller = state.read().await;
    let session = controller.session();
    Ok(session.video_id.as_deref().map(|video_id| {
        embed_url(
            video_id,
            session.video_start_offset_seconds,
            origin.as_deref(),
        )
    }))
}

/// Saves the CSV where the operator chooses; `None` when there was nothing
/// to export or the save dialog was cancelled.
#[tauri::command]
pub async fn export_session_csv(
    app_handle: AppHandle,
    state: State<'_, SharedController>,
) -> Result<Option<String>, String> {
    let mut prompt = DialogPrompt {
        app_handle: &app_handle,
    };
    let Some(csv_export) = state.read().await.export_csv(&mut prompt) else {
        return Ok(None);
    };

    let Some(file_path) = tokio::task::block_in_place(|| {
        app_handle
            .dialog()
            .file()
            .add_filter("CSV", &["csv"])
            .set_file_name(&csv_export.file_name)
            .blocking_save_file()
    }) else {
        return Ok(None);
    };
    let output_path = file_path.into_path().map_err(|error| error.to_string())?;

    tokio::fs::write(&output_path, csv_export.contents)
        .await
        .map_err(|error| format!("Failed to write '{}': {error}", output_path.display()))?;

    Ok(Some(output_path.to_string_lossy().to_string()))
}

#[tauri::command]
pub async fn load_default_roster(
    app_handle: AppHandle,
    state: State<'_, SharedController>,
) -> Result<RosterLoad, String> {
    let roster_path = state.read().await.settings().roster_path.clone();
    let roster_path = resolve_roster_path(&app_handle, &roster_path)?;

    Ok(load_roster_file(&roster_path, RosterOrigin::Bundled).await)
}

#[tauri::command]
pub async fn choose_roster_file(app_handle: AppHandle) -> Result<Option<RosterLoad>, String> {
    let Some(file_path) = tokio::task::block_in_place(|| {
        app_handle
            .dialog()
            .file()
            .add_filter("CSV", &["csv"])
            .blocking_pick_file()
    }) else {
        return Ok(None);
    };
    let roster_path = file_path.into_path().map_err(|error| error.to_string())?;

    Ok(Some(load_roster_file(&roster_path, RosterOrigin::Chosen).await))
}

/// Relative roster paths are looked up among the bundled resources.
fn resolve_roster_path(app_handle: &AppHandle, roster_path: &str) -> Result<PathBuf, String> {
    let roster_path = PathBuf::from(roster_path);
    if roster_path.is_absolute() {
        return Ok(roster_path);
    }

    let resource_directory = app_handle
        .path()
        .resource_dir()
        .map_err(|error| error.to_string())?;
    Ok(resource_directory.join(roster_path))
}
