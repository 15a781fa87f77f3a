//! Axum route handlers for worksheet generation.

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use tracing::{info, info_span};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::worksheet::generator::{build_worksheet_pdf, RenderedWorksheet};
use crate::worksheet::models::{AnswerKeyFlag, WorksheetRequest};
use crate::worksheet::questions::{QuestionSelector, RandomChoice};

/// POST /api/generate-pdf
///
/// Renders the requested worksheet and returns it as a PDF attachment.
pub async fn handle_generate_pdf(
    State(state): State<AppState>,
    Json(request): Json<WorksheetRequest>,
) -> Result<Response, AppError> {
    let max = state.config.max_questions;
    if request.num_questions() > max {
        return Err(AppError::Validation(format!(
            "numQuestions must be at most {max}"
        )));
    }
    let max_topic = state.config.max_topic_chars;
    if request.topic.chars().count() > max_topic {
        return Err(AppError::Validation(format!(
            "topic must be at most {max_topic} characters"
        )));
    }

    let rendered = render_in_background(&state, request).await?;
    Ok(pdf_response(rendered))
}

/// POST /api/v1/worksheets/sample
///
/// The fixed sample worksheet, aligned with the currently selected standards.
pub async fn handle_sample_worksheet(
    State(state): State<AppState>,
) -> Result<Response, AppError> {
    let standards = state.selection.read().await.codes();
    let request = sample_request(standards);
    let rendered = render_in_background(&state, request).await?;
    Ok(pdf_response(rendered))
}

/// Any non-POST method on the generation endpoint.
pub async fn handle_method_not_allowed() -> AppError {
    AppError::MethodNotAllowed
}

pub fn sample_request(standards: Vec<String>) -> WorksheetRequest {
    WorksheetRequest {
        title: Some("Sample Worksheet".to_string()),
        directions: "Use context clues to choose the best answer.".to_string(),
        question_type: QuestionSelector::Mixed,
        num_questions: Some(8),
        include_answer_key: AnswerKeyFlag::Text("yes".to_string()),
        standards,
        topic: String::new(),
    }
}

/// Rendering is CPU-bound; keep it off the async executor.
async fn render_in_background(
    state: &AppState,
    request: WorksheetRequest,
) -> Result<RenderedWorksheet, AppError> {
    let page_config = state.page_config.clone();
    let product = state.config.product_name.clone();
    let span = info_span!("worksheet_render", run_id = %Uuid::new_v4(), title = request.title());

    let rendered = tokio::task::spawn_blocking(move || {
        let _guard = span.enter();
        info!(
            questions = request.num_questions(),
            answer_key = request.include_answer_key.is_enabled(),
            "rendering worksheet"
        );
        build_worksheet_pdf(&request, &page_config, &product, &mut RandomChoice)
    })
    .await
    .map_err(|e| AppError::Internal(anyhow::anyhow!("spawn_blocking failed in render: {e}")))??;

    Ok(rendered)
}

fn pdf_response(rendered: RenderedWorksheet) -> Response {
    let disposition = format!("attachment; filename=\"{}\"", rendered.file_name);
    (
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Bytes::from(rendered.bytes),
    )
        .into_response()
}
