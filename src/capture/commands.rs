use std::collections::BTreeSet;

use tauri::State;

use crate::{
    capture::{CaptureController, PendingSnapshot},
    gui::AppState,
    library::{CitationRecord, ExportOptions, Library, SaveOutcome},
};

fn controller_from_state(state: &State<'_, AppState>) -> CaptureController {
    state.capture.clone()
}

#[tauri::command]
pub async fn get_pending(state: State<'_, AppState>) -> Result<Option<PendingSnapshot>, String> {
    Ok(controller_from_state(&state).pending().await)
}

#[tauri::command]
pub async fn update_note(state: State<'_, AppState>, note: String) -> Result<bool, String> {
    Ok(controller_from_state(&state).update_note(note).await)
}

#[tauri::command]
pub async fn hold_pending(state: State<'_, AppState>) -> Result<bool, String> {
    Ok(controller_from_state(&state).hold().await)
}

#[tauri::command]
pub async fn commit_pending(
    state: State<'_, AppState>,
    note: Option<String>,
) -> Result<Option<SaveOutcome>, String> {
    controller_from_state(&state)
        .on_commit(note)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn discard_pending(state: State<'_, AppState>) -> Result<bool, String> {
    Ok(controller_from_state(&state).discard().await)
}

/// Window closed without a choice: same as the countdown running out.
#[tauri::command]
pub async fn close_prompt(state: State<'_, AppState>) -> Result<Option<SaveOutcome>, String> {
    controller_from_state(&state)
        .on_timeout()
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn list_libraries(state: State<'_, AppState>) -> Result<BTreeSet<String>, String> {
    controller_from_state(&state)
        .libraries()
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn switch_library(state: State<'_, AppState>, name: String) -> Result<String, String> {
    controller_from_state(&state)
        .switch_library(&name)
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn list_citations(state: State<'_, AppState>) -> Result<Library, String> {
    controller_from_state(&state)
        .citations()
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn remove_citation(
    state: State<'_, AppState>,
    index: usize,
) -> Result<CitationRecord, String> {
    controller_from_state(&state)
        .remove_citation(index)
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn clear_library(state: State<'_, AppState>) -> Result<usize, String> {
    controller_from_state(&state)
        .clear_library()
        .map_err(|e| e.to_string())
}

/// Returns the export text; the window writes it wherever the user chose.
#[tauri::command]
pub async fn export_library(
    state: State<'_, AppState>,
    options: Option<ExportOptions>,
) -> Result<String, String> {
    controller_from_state(&state)
        .export(options)
        .map_err(|e| e.to_string())
}
