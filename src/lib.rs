pub mod controller;
pub mod display;
pub mod export;
pub mod ledger;
pub mod links;
pub mod logging;
pub mod persistence;
pub mod roster;
pub mod session;
pub mod settings;

#[cfg(feature = "desktop")]
mod commands;

#[cfg(feature = "desktop")]
const SETTINGS_FILE_NAME: &str = "settings.json";
#[cfg(feature = "desktop")]
const SESSION_STORE_FILE_NAME: &str = "session.json";

#[cfg(feature = "desktop")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    use std::sync::Arc;

    use tauri::Manager;
    use tauri_plugin_store::StoreExt;
    use tokio::sync::RwLock;

    use crate::controller::SessionController;
    use crate::persistence::TauriStore;
    use crate::settings::TaggerSettings;

    logging::init_tracing();

    tauri::Builder::default()
        .plugin(tauri_plugin_window_state::Builder::default().build())
        .plugin(tauri_plugin_store::Builder::default().build())
        .plugin(tauri_plugin_dialog::init())
        .setup(|app| {
            let settings_path = app.path().app_config_dir()?.join(SETTINGS_FILE_NAME);
            let settings = match TaggerSettings::load_from_path(&settings_path) {
                Ok(settings) => settings,
                Err(error) => {
                    tracing::error!(settings_error = %error, "Ignoring unreadable settings file");
                    TaggerSettings::default()
                }
            };

            let session_store = app.store(SESSION_STORE_FILE_NAME)?;
            let controller = SessionController::restore(TauriStore::new(session_store), settings);
            let shared_controller: commands::SharedController = Arc::new(RwLock::new(controller));
            app.manage(shared_controller);
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            commands::get_session,
            commands::dispatch_intent,
            commands::video_embed_url,
            commands::export_session_csv,
            commands::load_default_roster,
            commands::choose_roster_file,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
