use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::AppError;
use crate::standards::csv_import::{convert_csv, CsvColumnMapping, PackMetadata};
use crate::standards::models::{Standard, StandardsPack};
use crate::standards::registry::{FrameworkOption, PackSummary, StandardFilter};
use crate::standards::samples::load_pack_dir;
use crate::standards::selection::{SelectedStandard, StandardSelection};
use crate::state::AppState;

#[derive(Serialize)]
pub struct RegisterResponse {
    pub pack_id: String,
    pub frameworks_added: usize,
}

#[derive(Serialize)]
pub struct SamplesResponse {
    pub loaded: Vec<String>,
}

#[derive(Deserialize)]
pub struct CsvImportRequest {
    pub csv: String,
    #[serde(default)]
    pub delimiter: Option<char>,
    pub columns: CsvColumnMapping,
    #[serde(default)]
    pub metadata: PackMetadata,
    #[serde(default)]
    pub preview: bool,
}

#[derive(Deserialize)]
pub struct StandardsQuery {
    pub grade_band: Option<String>,
    pub q: Option<String>,
}

#[derive(Deserialize)]
pub struct SelectRequest {
    pub framework_id: String,
    pub code: String,
}

/// GET /api/v1/packs
pub async fn handle_list_packs(State(state): State<AppState>) -> Json<Vec<PackSummary>> {
    Json(state.packs.read().await.summaries())
}

/// POST /api/v1/packs
pub async fn handle_import_pack(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    let pack = StandardsPack::from_json(body)?;
    let pack_id = pack.id.clone();
    let frameworks_added = state.packs.write().await.register(pack);
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            pack_id,
            frameworks_added,
        }),
    ))
}

/// POST /api/v1/packs/samples
pub async fn handle_load_samples(
    State(state): State<AppState>,
) -> Result<Json<SamplesResponse>, AppError> {
    let packs = load_pack_dir(&state.config.packs_dir).await?;
    let mut registry = state.packs.write().await;
    let loaded = packs
        .into_iter()
        .map(|pack| {
            let id = pack.id.clone();
            registry.register(pack);
            id
        })
        .collect();
    Ok(Json(SamplesResponse { loaded }))
}

/// POST /api/v1/packs/csv
///
/// Converts a CSV export into a pack. With `preview` the pack is only returned.
pub async fn handle_import_csv(
    State(state): State<AppState>,
    Json(req): Json<CsvImportRequest>,
) -> Result<Json<StandardsPack>, AppError> {
    let pack = convert_csv(
        &req.csv,
        req.delimiter.unwrap_or(','),
        &req.columns,
        &req.metadata,
    )?;
    if !req.preview {
        state.packs.write().await.register(pack.clone());
    }
    Ok(Json(pack))
}

/// GET /api/v1/frameworks
pub async fn handle_list_frameworks(State(state): State<AppState>) -> Json<Vec<FrameworkOption>> {
    Json(state.packs.read().await.framework_options())
}

/// GET /api/v1/frameworks/:id/standards
pub async fn handle_list_standards(
    State(state): State<AppState>,
    Path(framework_id): Path<String>,
    Query(params): Query<StandardsQuery>,
) -> Result<Json<Vec<Standard>>, AppError> {
    let filter = StandardFilter {
        grade_band: params.grade_band,
        query: params.q,
    };
    let registry = state.packs.read().await;
    let standards = registry
        .search(&framework_id, &filter)
        .ok_or_else(|| AppError::NotFound(format!("Framework {framework_id} not found")))?;
    Ok(Json(standards.into_iter().cloned().collect()))
}

/// GET /api/v1/selection
pub async fn handle_get_selection(State(state): State<AppState>) -> Json<StandardSelection> {
    Json(state.selection.read().await.clone())
}

/// POST /api/v1/selection
pub async fn handle_add_selection(
    State(state): State<AppState>,
    Json(req): Json<SelectRequest>,
) -> Result<Json<StandardSelection>, AppError> {
    let item = {
        let registry = state.packs.read().await;
        let framework = registry
            .find_framework(&req.framework_id)
            .ok_or_else(|| AppError::NotFound(format!("Framework {} not found", req.framework_id)))?;
        let standard = framework
            .framework
            .standards
            .iter()
            .find(|s| s.code == req.code)
            .ok_or_else(|| AppError::NotFound(format!("Standard {} not found", req.code)))?;
        let name = if standard.statement.is_empty() {
            standard.code.clone()
        } else {
            standard.statement.clone()
        };
        SelectedStandard {
            code: standard.code.clone(),
            name,
            framework: framework.framework.name.clone(),
        }
    };

    let mut selection = state.selection.write().await;
    selection.add(item);
    Ok(Json(selection.clone()))
}

/// DELETE /api/v1/selection/:code
pub async fn handle_remove_selection(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<StandardSelection>, AppError> {
    let mut selection = state.selection.write().await;
    if !selection.remove(&code) {
        return Err(AppError::NotFound(format!("Standard {code} is not selected")));
    }
    Ok(Json(selection.clone()))
}

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request};
    use serde_json::json;
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::layout::default_page_config;
    use crate::routes::build_router;

    use super::*;

    fn test_state() -> AppState {
        AppState::new(Config::default(), default_page_config())
    }

    fn request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
        let builder = Request::builder().method(method).uri(uri);
        match body {
            Some(b) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn call(state: &AppState, req: Request<Body>) -> (StatusCode, Value) {
        let response = build_router(state.clone()).oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    fn ela_pack() -> Value {
        json!({
            "id": "ccss-ela",
            "name": "CCSS ELA",
            "frameworks": [{
                "id": "ela-3-5",
                "name": "ELA 3-5",
                "standards": [
                    { "code": "RL.4.4", "statement": "Determine word meaning", "grades": ["3-5"] },
                    { "code": "RL.4.9", "statement": "", "grades": ["3-5"] }
                ]
            }]
        })
    }

    #[tokio::test]
    async fn test_import_pack_then_browse() {
        let state = test_state();
        let (status, body) = call(&state, request("POST", "/api/v1/packs", Some(ela_pack()))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["frameworks_added"], 1);

        let (_, frameworks) = call(&state, request("GET", "/api/v1/frameworks", None)).await;
        assert_eq!(frameworks[0]["label"], "ELA 3-5 (CCSS ELA)");

        let (status, standards) = call(
            &state,
            request("GET", "/api/v1/frameworks/ela-3-5/standards?q=meaning", None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(standards.as_array().unwrap().len(), 1);
        assert_eq!(standards[0]["code"], "RL.4.4");
    }

    #[tokio::test]
    async fn test_import_pack_without_id_is_bad_request() {
        let state = test_state();
        let (status, body) =
            call(&state, request("POST", "/api/v1/packs", Some(json!({ "name": "x" })))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "Pack missing 'id'");
    }

    #[tokio::test]
    async fn test_unknown_framework_is_not_found() {
        let state = test_state();
        let (status, _) = call(
            &state,
            request("GET", "/api/v1/frameworks/nope/standards", None),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_selection_add_dedup_and_remove() {
        let state = test_state();
        call(&state, request("POST", "/api/v1/packs", Some(ela_pack()))).await;

        let select = |code: &str| {
            request(
                "POST",
                "/api/v1/selection",
                Some(json!({ "framework_id": "ela-3-5", "code": code })),
            )
        };
        call(&state, select("RL.4.4")).await;
        call(&state, select("RL.4.4")).await;
        let (_, body) = call(&state, select("RL.4.9")).await;
        let items = body["items"].as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["name"], "Determine word meaning");
        assert_eq!(items[1]["name"], "RL.4.9");
        assert_eq!(items[1]["framework"], "ELA 3-5");

        let (status, body) = call(&state, request("DELETE", "/api/v1/selection/RL.4.4", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["items"].as_array().unwrap().len(), 1);

        let (status, _) = call(&state, request("DELETE", "/api/v1/selection/RL.4.4", None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_csv_preview_does_not_register() {
        let state = test_state();
        let body = json!({
            "csv": "Code,Description\nRL.4.4,Determine word meaning\n",
            "columns": { "code": "Code", "statement": "Description" },
            "preview": true
        });
        let (status, pack) = call(&state, request("POST", "/api/v1/packs/csv", Some(body))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(pack["id"], "state-pack");
        assert_eq!(state.packs.read().await.pack_count(), 0);
    }

    #[tokio::test]
    async fn test_csv_import_registers_pack() {
        let state = test_state();
        let body = json!({
            "csv": "Code;Description\nRL.4.4;Determine word meaning\n",
            "delimiter": ";",
            "columns": { "code": "Code", "statement": "Description" },
            "metadata": { "pack_id": "tx-ela" }
        });
        let (status, _) = call(&state, request("POST", "/api/v1/packs/csv", Some(body))).await;
        assert_eq!(status, StatusCode::OK);
        let registry = state.packs.read().await;
        assert_eq!(registry.pack("tx-ela").unwrap().frameworks[0].standards.len(), 1);
    }

    #[tokio::test]
    async fn test_load_samples_registers_bundled_packs() {
        let mut config = Config::default();
        config.packs_dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../packs");
        let state = AppState::new(config, default_page_config());
        let (status, body) = call(&state, request("POST", "/api/v1/packs/samples", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(!body["loaded"].as_array().unwrap().is_empty());

        let (_, packs) = call(&state, request("GET", "/api/v1/packs", None)).await;
        assert_eq!(
            packs.as_array().unwrap().len(),
            body["loaded"].as_array().unwrap().len()
        );
    }
}
