//! Answer Key Renderer — a fixed 3-column grid on its own page.
//!
//! The grid is not paginated. With the request ceiling on question count it fits one
//! letter page; past that the overflow is only logged.

use tracing::warn;

use crate::layout::engine::{LayoutEngine, BODY_SIZE, TITLE_SIZE, TITLE_TOP};
use crate::layout::sink::{DocumentSink, DrawOp, RenderError, TextStyle};
use crate::worksheet::questions::AnswerRecord;

pub const ANSWER_KEY_TITLE: &str = "Answer Key";
pub const GRID_COLUMNS: usize = 3;
pub const GRID_TOP: f32 = 100.0;
pub const ROW_HEIGHT: f32 = 20.0;

/// `(column, row)` of the `index`-th record (0-based).
pub fn grid_position(index: usize) -> (usize, usize) {
    (index % GRID_COLUMNS, index / GRID_COLUMNS)
}

/// Top-left corner of a grid cell for a page with the given margin and content width.
pub fn cell_origin(index: usize, margin: f32, content_width: f32) -> (f32, f32) {
    let (col, row) = grid_position(index);
    let col_width = content_width / GRID_COLUMNS as f32;
    (
        margin + col as f32 * col_width,
        GRID_TOP + row as f32 * ROW_HEIGHT,
    )
}

/// Starts a new page, draws the title and the answers grid, then stamps the footer.
pub fn render_answer_key<S: DocumentSink>(
    engine: &mut LayoutEngine<'_, S>,
    answers: &[AnswerRecord],
) -> Result<(), RenderError> {
    engine.break_page()?;
    let cursor = engine.cursor();
    let width = cursor.content_width();
    let col_width = width / GRID_COLUMNS as f32;

    engine.sink_mut().draw(&DrawOp::Text {
        text: ANSWER_KEY_TITLE.to_string(),
        x: cursor.left(),
        y: TITLE_TOP,
        style: TextStyle::left(TITLE_SIZE, width),
    })?;

    for (i, record) in answers.iter().enumerate() {
        let (x, y) = cell_origin(i, cursor.left(), width);
        engine.sink_mut().draw(&DrawOp::Text {
            text: format!("{}. {}", record.number, record.answer),
            x,
            y,
            style: TextStyle::left(BODY_SIZE, col_width),
        })?;
    }

    if let Some(last) = answers.len().checked_sub(1) {
        let (_, bottom) = cell_origin(last, cursor.left(), width);
        if bottom + ROW_HEIGHT > cursor.footer_top() {
            warn!(
                entries = answers.len(),
                "answer key grid runs past the footer band"
            );
        }
    }

    engine.stamp_footer()?;
    Ok(())
}
