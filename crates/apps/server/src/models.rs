use axum::body::Body;
use axum::extract::{Path as AxumPath, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use catalog::{validate_name, ModelRecord};
use compute::{analyze_walls, WallAnalysis};
use formats::{load_mesh, AssetKind, UpAxis};
use serde::Serialize;
use serde_json::json;
use tracing::{error, info, warn};

use crate::error::{api_error, ApiError};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct WallsResponse {
    pub filename: String,
    pub walls: Vec<WallAnalysis>,
}

pub async fn list_models(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<ModelRecord>>, ApiError> {
    let base = state.public_base(&headers);
    let records = state
        .store
        .list()
        .await
        .map_err(|e| {
            error!("error reading models: {e}");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to read models")
        })?
        .into_iter()
        .map(|m| m.into_record(&base))
        .collect();
    Ok(Json(records))
}

pub async fn get_model(
    State(state): State<AppState>,
    AxumPath(filename): AxumPath<String>,
) -> Result<Response, ApiError> {
    let data = state.store.read(&filename).await?;
    let content_type = AssetKind::from_file_name(&filename)
        .map(AssetKind::content_type)
        .unwrap_or("application/octet-stream");

    let mut headers = HeaderMap::new();
    headers.insert(
        http::header::CONTENT_TYPE,
        HeaderValue::from_static(content_type),
    );
    Ok((StatusCode::OK, headers, Body::from(data)).into_response())
}

pub async fn delete_model(
    State(state): State<AppState>,
    AxumPath(filename): AxumPath<String>,
) -> Result<Response, ApiError> {
    state.store.delete(&filename).await?;
    info!("deleted model {filename}");
    Ok(Json(json!({ "success": true, "message": "Model deleted successfully" })).into_response())
}

pub async fn get_walls(
    State(state): State<AppState>,
    AxumPath(filename): AxumPath<String>,
) -> Result<Json<WallsResponse>, ApiError> {
    validate_name(&filename)?;
    if !AssetKind::from_file_name(&filename).is_some_and(AssetKind::is_model) {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "Only .glb, .gltf and .obj models can be analyzed",
        ));
    }
    if !state.store.contains(&filename).await? {
        return Err(api_error(StatusCode::NOT_FOUND, "Model not found"));
    }

    let path = state.store.path(&filename)?;
    let config = state.config.walls;
    let analysis = tokio::task::spawn_blocking(move || {
        load_mesh(&path, UpAxis::Y).map(|mesh| analyze_walls(&mesh, &config))
    })
    .await
    .map_err(|e| {
        error!("wall analysis task failed: {e}");
        api_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
    })?;

    match analysis {
        Ok(walls) => {
            info!("{filename}: {} walls", walls.len());
            Ok(Json(WallsResponse { filename, walls }))
        }
        Err(e) => {
            warn!("{filename}: mesh load failed: {e}");
            Err(api_error(
                StatusCode::UNPROCESSABLE_ENTITY,
                format!("Could not read model geometry: {e}"),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use compute::WallAnalysisConfig;
    use pretty_assertions::assert_eq;

    use crate::config::ServerConfig;
    use crate::test_support::{get, json, send, state};

    const CUBE_OBJ: &str = "\
v 0 0 0
v 1 0 0
v 0 1 0
v 1 1 0
v 0 0 1
v 1 0 1
v 0 1 1
v 1 1 1
f 1 3 7 5
f 2 6 8 4
f 1 5 6 2
f 3 4 8 7
f 1 2 4 3
f 5 7 8 6
";

    fn delete(uri: &str) -> Request<Body> {
        Request::builder()
            .method("DELETE")
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    #[tokio::test]
    async fn list_serve_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(&dir, "http://127.0.0.1:1").await;
        std::fs::write(state.store.root().join("house.glb"), b"glTF").unwrap();

        let listed = json(send(&state, get("/models")).await).await;
        assert_eq!(listed[0]["filename"], "house.glb");
        assert_eq!(listed[0]["originalName"], "house.glb");
        assert_eq!(listed[0]["url"], "http://localhost:3001/models/house.glb");
        assert_eq!(listed[0]["size"], 4);

        let resp = send(&state, get("/models/house.glb")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers()[http::header::CONTENT_TYPE],
            "model/gltf-binary"
        );

        let resp = send(&state, delete("/models/house.glb")).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(json(resp).await["message"], "Model deleted successfully");

        let resp = send(&state, delete("/models/house.glb")).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert_eq!(json(resp).await["error"], "Model not found");
        assert_eq!(
            send(&state, get("/models/house.glb")).await.status(),
            StatusCode::NOT_FOUND
        );
    }

    #[tokio::test]
    async fn hidden_names_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(&dir, "http://127.0.0.1:1").await;
        let resp = send(&state, delete("/models/.env")).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn walls_of_an_obj_cube() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(&dir, "http://127.0.0.1:1").await;
        std::fs::write(state.store.root().join("cube.obj"), CUBE_OBJ).unwrap();

        // Quads fan into two triangles each, below the default group size.
        let body = json(send(&state, get("/models/cube.obj/walls")).await).await;
        assert_eq!(body["filename"], "cube.obj");
        assert_eq!(body["walls"], serde_json::json!([]));

        let mut state = state;
        state.config = Arc::new(ServerConfig {
            walls: WallAnalysisConfig {
                min_faces: 2,
                ..WallAnalysisConfig::default()
            },
            ..(*state.config).clone()
        });
        let body = json(send(&state, get("/models/cube.obj/walls")).await).await;
        let mut orientations: Vec<f64> = body["walls"]
            .as_array()
            .unwrap()
            .iter()
            .map(|w| w["orientation"].as_f64().unwrap().round())
            .collect();
        orientations.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(orientations, vec![0.0, 90.0, 180.0, 270.0]);
    }

    #[tokio::test]
    async fn walls_refuse_buffers_outside_the_store() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(&dir, "http://127.0.0.1:1").await;
        let coords: [f32; 9] = [10.0, 0.0, 0.0, 11.0, 0.0, 0.0, 10.0, 1.0, 0.0];
        let bin: Vec<u8> = coords.iter().flat_map(|c| c.to_le_bytes()).collect();
        std::fs::write(dir.path().join("secret.bin"), bin).unwrap();
        let gltf = serde_json::json!({
            "asset": { "version": "2.0" },
            "buffers": [{ "uri": "../secret.bin", "byteLength": 36 }],
            "bufferViews": [{ "buffer": 0, "byteOffset": 0, "byteLength": 36 }],
            "accessors": [{
                "bufferView": 0,
                "componentType": 5126,
                "count": 3,
                "type": "VEC3",
                "min": [10.0, 0.0, 0.0],
                "max": [11.0, 1.0, 0.0]
            }],
            "meshes": [{ "primitives": [{ "attributes": { "POSITION": 0 } }] }]
        });
        std::fs::write(state.store.root().join("evil.gltf"), gltf.to_string()).unwrap();

        let resp = send(&state, get("/models/evil.gltf/walls")).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = json(resp).await;
        assert!(body["error"].as_str().unwrap().contains("../secret.bin"));
        assert!(body.get("walls").is_none());
    }

    #[tokio::test]
    async fn walls_error_statuses() {
        let dir = tempfile::tempdir().unwrap();
        let state = state(&dir, "http://127.0.0.1:1").await;
        std::fs::write(state.store.root().join("tex.png"), b"png").unwrap();
        std::fs::write(state.store.root().join("broken.obj"), "f 1 2 3\n").unwrap();

        let cases = [
            ("/models/tex.png/walls", StatusCode::BAD_REQUEST),
            ("/models/ghost.glb/walls", StatusCode::NOT_FOUND),
            ("/models/broken.obj/walls", StatusCode::UNPROCESSABLE_ENTITY),
        ];
        for (uri, status) in cases {
            assert_eq!(send(&state, get(uri)).await.status(), status, "{uri}");
        }
    }
}
