//! Worksheet pipeline: request → questions → layout → answer key → PDF bytes.
//!
//! Rendering is CPU-bound and synchronous; handlers run it inside
//! `tokio::task::spawn_blocking`.

use tracing::info;

use crate::layout::answer_key::render_answer_key;
use crate::layout::engine::{footer_hook, LayoutEngine};
use crate::layout::font_metrics::{helvetica, PageConfig, TextMeasure};
use crate::layout::sink::{DocumentSink, PdfSink, RenderError};
use crate::worksheet::models::WorksheetRequest;
use crate::worksheet::questions::{generate_questions, ChoicePolicy, Question};

const DIRECTIONS_SIZE: f32 = 13.0;

/// What one render produced besides the drawn pages.
#[derive(Debug, Clone)]
pub struct RenderSummary {
    pub pages: u32,
    pub questions: usize,
}

#[derive(Debug)]
pub struct RenderedWorksheet {
    pub file_name: String,
    pub pages: u32,
    pub bytes: Vec<u8>,
}

/// Lays out a full worksheet into `sink`. Any measurement or sink failure aborts the
/// run; the sink is only handed back on success.
pub fn render_worksheet<S: DocumentSink>(
    request: &WorksheetRequest,
    questions: &[Question],
    sink: S,
    measure: &dyn TextMeasure,
    page: &PageConfig,
    product: &str,
) -> Result<(S, RenderSummary), RenderError> {
    let mut engine = LayoutEngine::new(
        sink,
        measure,
        page,
        footer_hook(product, &request.standards),
    );

    engine.render_title(request.title())?;
    if let Some(directions) = request.directions() {
        engine.render_section_header("Directions")?;
        engine.flow_paragraph(directions, DIRECTIONS_SIZE)?;
    }
    engine.render_section_header("Questions")?;
    let answers = engine.render_questions(questions)?;

    if request.include_answer_key.is_enabled() {
        render_answer_key(&mut engine, &answers)?;
    }

    let summary = RenderSummary {
        pages: engine.page_number(),
        questions: answers.len(),
    };
    Ok((engine.into_sink(), summary))
}

/// Generates the questions and renders the worksheet to PDF bytes.
pub fn build_worksheet_pdf(
    request: &WorksheetRequest,
    page: &PageConfig,
    product: &str,
    policy: &mut dyn ChoicePolicy,
) -> Result<RenderedWorksheet, RenderError> {
    let questions = generate_questions(
        request.num_questions(),
        &request.question_type,
        &request.topic,
        policy,
    );
    let metrics = helvetica();
    let sink = PdfSink::new(page, metrics);
    let (sink, summary) = render_worksheet(request, &questions, sink, metrics, page, product)?;
    let bytes = sink.finish();

    info!(
        pages = summary.pages,
        questions = summary.questions,
        bytes = bytes.len(),
        "worksheet rendered"
    );

    Ok(RenderedWorksheet {
        file_name: request.file_name(),
        pages: summary.pages,
        bytes,
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
