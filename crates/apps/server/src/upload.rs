//! `POST /upload`: multipart model upload.
//!
//! Every file of a request is streamed into a staged temp file inside the
//! store. Nothing is committed until the whole request has been read and
//! validated, so a rejected request leaves the store untouched. If a commit
//! fails partway, the files this request already committed are removed
//! again; a stored file that one of them replaced is not restored.

use axum::extract::multipart::{Field, MultipartError};
use axum::extract::{Multipart, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use catalog::{model_url, storage_name, StagedUpload};
use formats::{gltf_external_uris, AssetKind};
use serde::Serialize;
use tracing::{error, info, warn};

use crate::error::{api_error, ApiError};
use crate::AppState;

const UPLOAD_FIELD: &str = "model";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub success: bool,
    pub filename: String,
    pub original_name: String,
    pub url: String,
    pub size: u64,
    pub uploaded_files: Vec<String>,
    /// Files the uploaded glTF references but the store does not have.
    pub warnings: Vec<String>,
}

struct PendingFile {
    original_name: String,
    kind: AssetKind,
    staged: StagedUpload,
    /// Kept in memory for `.gltf` documents only, to scan their references.
    gltf_json: Option<Vec<u8>>,
}

pub async fn upload_models(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let config = &state.config;
    let mut pending: Vec<PendingFile> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(&state, e))?
    {
        let Some(original_name) = field.file_name().map(str::to_string) else {
            // Plain form values carry nothing to store.
            continue;
        };
        if field.name() != Some(UPLOAD_FIELD) {
            return Err(api_error(StatusCode::BAD_REQUEST, "Unexpected field"));
        }
        if pending.len() >= config.max_files {
            return Err(api_error(
                StatusCode::BAD_REQUEST,
                format!("Too many files. Maximum is {}.", config.max_files),
            ));
        }
        let Some(kind) = AssetKind::from_file_name(&original_name) else {
            return Err(api_error(
                StatusCode::BAD_REQUEST,
                "Invalid file type. Only 3D model files and related assets are allowed.",
            ));
        };

        pending.push(stage_field(&state, field, original_name, kind).await?);
    }

    if pending.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "No files uploaded"));
    }
    let Some(main_index) = pending.iter().position(|f| f.kind.is_model()) else {
        return Err(api_error(StatusCode::BAD_REQUEST, "No valid 3D model file found"));
    };

    // A .gltf points at its buffers and textures by name, so an upload that
    // contains one stores every file under the name it was sent with.
    let keep_original = pending.iter().any(|f| f.kind == AssetKind::Gltf);
    let mut names = Vec::with_capacity(pending.len());
    for file in &pending {
        names.push(storage_name(&file.original_name, UPLOAD_FIELD, keep_original)?);
    }

    let warnings = missing_references(&state, &pending, &names).await;
    for warning in &warnings {
        warn!("upload references missing file {warning}");
    }

    let uploaded_files: Vec<String> = pending.iter().map(|f| f.original_name.clone()).collect();
    let mut main = None;
    let mut committed: Vec<String> = Vec::new();
    for (index, (file, name)) in pending.into_iter().zip(names).enumerate() {
        let stored = match file.staged.commit(&name).await {
            Ok(stored) => stored,
            Err(e) => {
                rollback(&state, &committed).await;
                return Err(e.into());
            }
        };
        info!("stored {} as {} ({} bytes)", file.original_name, stored.filename, stored.size);
        committed.push(stored.filename.clone());
        if index == main_index {
            main = Some((file.original_name, stored));
        }
    }
    let Some((original_name, stored)) = main else {
        return Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, "Upload failed"));
    };

    let base = state.public_base(&headers);
    Ok(Json(UploadResponse {
        success: true,
        url: model_url(&base, &stored.filename),
        filename: stored.filename,
        original_name,
        size: stored.size,
        uploaded_files,
        warnings,
    }))
}

async fn stage_field(
    state: &AppState,
    mut field: Field<'_>,
    original_name: String,
    kind: AssetKind,
) -> Result<PendingFile, ApiError> {
    let max_size = state.config.max_file_size();
    let mut staged = state.store.stage().await?;
    let mut gltf_json = (kind == AssetKind::Gltf).then(Vec::new);

    while let Some(chunk) = field
        .chunk()
        .await
        .map_err(|e| multipart_error(state, e))?
    {
        if staged.len() + chunk.len() as u64 > max_size {
            return Err(too_large(state));
        }
        staged.write(&chunk).await?;
        if let Some(json) = gltf_json.as_mut() {
            json.extend_from_slice(&chunk);
        }
    }

    Ok(PendingFile {
        original_name,
        kind,
        staged,
        gltf_json,
    })
}

async fn rollback(state: &AppState, committed: &[String]) {
    for name in committed {
        match state.store.delete(name).await {
            Ok(()) => warn!("rolled back {name} after a failed upload"),
            Err(e) => error!("could not roll back {name}: {e}"),
        }
    }
}

/// Relative references of uploaded `.gltf` files that neither came with the
/// upload nor are already stored. `names` are the storage names of `pending`.
async fn missing_references(
    state: &AppState,
    pending: &[PendingFile],
    names: &[String],
) -> Vec<String> {
    let mut missing = Vec::new();
    for file in pending {
        let Some(json) = &file.gltf_json else {
            continue;
        };
        let uris = match gltf_external_uris(json) {
            Ok(uris) => uris,
            Err(e) => {
                missing.push(format!("{}: unreadable glTF ({e})", file.original_name));
                continue;
            }
        };
        for uri in uris {
            let uploaded = names.iter().any(|n| *n == uri);
            let stored = state.store.contains(&uri).await.unwrap_or(false);
            if !uploaded && !stored && !missing.contains(&uri) {
                missing.push(uri);
            }
        }
    }
    missing
}

fn too_large(state: &AppState) -> ApiError {
    api_error(
        StatusCode::BAD_REQUEST,
        format!(
            "File too large. Maximum size is {}MB.",
            state.config.max_file_size_mb
        ),
    )
}

fn multipart_error(state: &AppState, err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return too_large(state);
    }
    warn!("malformed upload: {}", err.body_text());
    api_error(StatusCode::BAD_REQUEST, err.body_text())
}
