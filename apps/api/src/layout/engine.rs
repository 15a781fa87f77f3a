//! Page Layout Engine — streams worksheet blocks onto pages.
//!
//! # Architecture
//! - `LayoutCursor` is the only mutable layout state; one engine owns it for one document.
//! - Every page transition goes through `break_page`, which stamps the footer of the
//!   outgoing page before the sink opens the next one.
//! - Footers are idempotent per page number: the explicit stamps at section ends can
//!   never draw a second footer on a page the transition already stamped.
//! - Questions are planned (measured into `DrawOp`s) before anything is drawn, so a
//!   question can be moved to the next page whole instead of being split.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::layout::font_metrics::{PageConfig, TextMeasure};
use crate::layout::sink::{DocumentSink, DrawOp, RenderError, Rgb, TextAlign, TextStyle};
use crate::worksheet::questions::{AnswerRecord, Question, QuestionBody};

/// Cursor position right after a page break.
pub const TOP_MARGIN: f32 = 72.0;
/// A block that leaves the cursor below `page_height - BOTTOM_RESERVE` forces a break.
pub const BOTTOM_RESERVE: f32 = 96.0;
/// Distance of the footer band from the page bottom.
pub const FOOTER_OFFSET: f32 = 36.0;
/// First cursor position on page 1, below the title region.
pub const CONTENT_START: f32 = 96.0;
pub const TITLE_TOP: f32 = 60.0;
pub const TITLE_SIZE: f32 = 18.0;
pub const BODY_SIZE: f32 = 11.0;

const HEADER_SIZE: f32 = 12.0;
const HEADER_RULE_OFFSET: f32 = 16.0;
const HEADER_HEIGHT: f32 = 24.0;
const PARAGRAPH_SPACING: f32 = 8.0;
const FOOTER_SIZE: f32 = 8.0;

const PROMPT_SPACING: f32 = 4.0;
const STEM_INDENT: f32 = 8.0;
const STEM_SPACING: f32 = 6.0;
const CHOICE_INDENT: f32 = 12.0;
const CHOICE_SPACING: f32 = 3.0;
const ANSWER_LINE_STEP: f32 = 16.0;
const ANSWER_LINES_TRAILER: f32 = 4.0;
const ORGANIZER_GAP: f32 = 12.0;
const ORGANIZER_BOX_HEIGHT: f32 = 70.0;
const ORGANIZER_PADDING: f32 = 6.0;
const SEPARATOR_SPACING: f32 = 8.0;

// ────────────────────────────────────────────────────────────────────────────
// Cursor
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutCursor {
    pub y: f32,
    pub page_width: f32,
    pub page_height: f32,
    pub margin: f32,
}

impl LayoutCursor {
    pub fn new(page: &PageConfig) -> Self {
        Self {
            y: CONTENT_START,
            page_width: page.page_width_pt,
            page_height: page.page_height_pt,
            margin: page.margin_pt,
        }
    }

    pub fn content_width(&self) -> f32 {
        self.page_width - 2.0 * self.margin
    }

    pub fn left(&self) -> f32 {
        self.margin
    }

    pub fn right(&self) -> f32 {
        self.page_width - self.margin
    }

    /// Past this offset the next block starts on a new page.
    pub fn break_threshold(&self) -> f32 {
        self.page_height - BOTTOM_RESERVE
    }

    /// Top edge of the footer band; content must end above it.
    pub fn footer_top(&self) -> f32 {
        self.page_height - FOOTER_OFFSET
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Footer
// ────────────────────────────────────────────────────────────────────────────

pub type FooterHook<'a> =
    Box<dyn Fn(&mut dyn DocumentSink, &LayoutCursor) -> Result<(), RenderError> + 'a>;

/// Builds the footer hook bound to one product name and one standards list.
pub fn footer_hook<'a>(product: &'a str, standards: &'a [String]) -> FooterHook<'a> {
    Box::new(move |sink: &mut dyn DocumentSink, cursor: &LayoutCursor| {
        draw_footer(sink, cursor, product, standards)
    })
}

/// Three equal columns: product name, aligned standards, page number.
pub fn draw_footer(
    sink: &mut dyn DocumentSink,
    cursor: &LayoutCursor,
    product: &str,
    standards: &[String],
) -> Result<(), RenderError> {
    let bottom = cursor.footer_top();
    let column = cursor.content_width() / 3.0;
    let codes = if standards.is_empty() {
        "—".to_string()
    } else {
        standards.join(", ")
    };
    let page = sink.page_number();

    let columns = [
        (product.to_string(), TextAlign::Left),
        (format!("Aligned with: {codes}"), TextAlign::Center),
        (format!("Page {page}"), TextAlign::Right),
    ];
    for (i, (text, align)) in columns.into_iter().enumerate() {
        sink.draw(&DrawOp::Text {
            text,
            x: cursor.left() + i as f32 * column,
            y: bottom,
            style: TextStyle {
                size: FOOTER_SIZE,
                color: Rgb::MUTED,
                width: column,
                align,
            },
        })?;
    }
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// Engine
// ────────────────────────────────────────────────────────────────────────────

/// Draw operations for one question plus the cursor position after it.
#[derive(Debug, Clone)]
pub struct QuestionPlan {
    pub ops: Vec<DrawOp>,
    pub bottom: f32,
}

pub struct LayoutEngine<'a, S: DocumentSink> {
    sink: S,
    measure: &'a dyn TextMeasure,
    cursor: LayoutCursor,
    footer: FooterHook<'a>,
    stamped_pages: BTreeSet<u32>,
}

impl<'a, S: DocumentSink> LayoutEngine<'a, S> {
    pub fn new(
        sink: S,
        measure: &'a dyn TextMeasure,
        page: &PageConfig,
        footer: FooterHook<'a>,
    ) -> Self {
        Self {
            sink,
            measure,
            cursor: LayoutCursor::new(page),
            footer,
            stamped_pages: BTreeSet::new(),
        }
    }

    pub fn cursor(&self) -> LayoutCursor {
        self.cursor
    }

    pub fn page_number(&self) -> u32 {
        self.sink.page_number()
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Draws the footer on the current page unless it already has one.
    /// Returns whether a footer was drawn.
    pub fn stamp_footer(&mut self) -> Result<bool, RenderError> {
        let page = self.sink.page_number();
        if !self.stamped_pages.insert(page) {
            return Ok(false);
        }
        (self.footer)(&mut self.sink, &self.cursor)?;
        Ok(true)
    }

    /// Page transition: footer for the outgoing page, then a fresh page with the
    /// cursor at the top margin.
    pub fn break_page(&mut self) -> Result<(), RenderError> {
        self.stamp_footer()?;
        let page = self.sink.add_page()?;
        self.cursor.y = TOP_MARGIN;
        debug!(page, "page break");
        Ok(())
    }

    fn draw_all(&mut self, ops: &[DrawOp]) -> Result<(), RenderError> {
        for op in ops {
            self.sink.draw(op)?;
        }
        Ok(())
    }

    fn text_op(&self, text: &str, x: f32, y: f32, size: f32, width: f32) -> DrawOp {
        DrawOp::Text {
            text: text.to_string(),
            x,
            y,
            style: TextStyle::left(size, width),
        }
    }

    fn rule_op(&self, y: f32) -> DrawOp {
        DrawOp::Rule {
            x1: self.cursor.left(),
            x2: self.cursor.right(),
            y,
        }
    }

    /// Title at the fixed top offset. The cursor is not moved.
    pub fn render_title(&mut self, title: &str) -> Result<(), RenderError> {
        let op = self.text_op(
            title,
            self.cursor.left(),
            TITLE_TOP,
            TITLE_SIZE,
            self.cursor.content_width(),
        );
        self.sink.draw(&op)
    }

    /// Upper-cased label with a rule beneath it. A header that would start inside the
    /// bottom reserve moves to the next page first.
    pub fn render_section_header(&mut self, label: &str) -> Result<f32, RenderError> {
        if self.cursor.y > self.cursor.break_threshold() {
            self.break_page()?;
        }
        let y = self.cursor.y;
        let ops = [
            self.text_op(
                &label.to_uppercase(),
                self.cursor.left(),
                y,
                HEADER_SIZE,
                self.cursor.content_width(),
            ),
            self.rule_op(y + HEADER_RULE_OFFSET),
        ];
        self.draw_all(&ops)?;
        self.cursor.y = y + HEADER_HEIGHT;
        Ok(self.cursor.y)
    }

    /// Wrapped paragraph at the content width. Pagination is the caller's concern.
    pub fn render_paragraph(&mut self, text: &str, font_size: f32) -> Result<f32, RenderError> {
        let width = self.cursor.content_width();
        let height = self.measure.height_of(text, width, font_size)?;
        let op = self.text_op(text, self.cursor.left(), self.cursor.y, font_size, width);
        self.sink.draw(&op)?;
        self.cursor.y += height + PARAGRAPH_SPACING;
        Ok(self.cursor.y)
    }

    /// Paragraph that continues on following pages. Each page gets the wrapped lines
    /// that end above the break threshold; the rest carries over to `TOP_MARGIN`.
    pub fn flow_paragraph(&mut self, text: &str, font_size: f32) -> Result<f32, RenderError> {
        let width = self.cursor.content_width();
        let mut chunk: Vec<String> = Vec::new();
        let mut chunk_height = 0.0;

        for line in self.measure.lines_of(text, width, font_size)? {
            // a blank line still takes a line of height
            let sample = if line.is_empty() { " " } else { line.as_str() };
            let h = self.measure.height_of(sample, width, font_size)?;
            if self.cursor.y + chunk_height + h > self.cursor.break_threshold() {
                if !chunk.is_empty() {
                    self.render_paragraph(&chunk.join("\n"), font_size)?;
                    chunk.clear();
                    chunk_height = 0.0;
                    self.break_page()?;
                } else if self.cursor.y > TOP_MARGIN {
                    self.break_page()?;
                }
            }
            chunk.push(line);
            chunk_height += h;
        }
        if !chunk.is_empty() {
            self.render_paragraph(&chunk.join("\n"), font_size)?;
        }
        Ok(self.cursor.y)
    }

    /// Lowest point an op reaches on the page.
    fn op_bottom(&self, op: &DrawOp) -> Result<f32, RenderError> {
        Ok(match op {
            DrawOp::Text { text, y, style, .. } => {
                y + self.measure.height_of(text, style.width, style.size)?
            }
            DrawOp::Rule { y, .. } => *y,
            DrawOp::Frame { y, h, .. } => y + h,
        })
    }

    /// `count` blank answer lines starting at `y`; returns the offset after them.
    fn plan_answer_lines(&self, ops: &mut Vec<DrawOp>, y: f32, count: usize) -> f32 {
        for i in 0..count {
            ops.push(self.rule_op(y + i as f32 * ANSWER_LINE_STEP));
        }
        y + count as f32 * ANSWER_LINE_STEP + ANSWER_LINES_TRAILER
    }

    /// Measures a question laid out from `top` without drawing it.
    pub fn plan_question(&self, question: &Question, top: f32) -> Result<QuestionPlan, RenderError> {
        let left = self.cursor.left();
        let width = self.cursor.content_width();
        let mut ops = Vec::new();
        let mut y = top;

        ops.push(self.text_op(&question.prompt, left, y, BODY_SIZE, width));
        y += self.measure.height_of(&question.prompt, width, BODY_SIZE)? + PROMPT_SPACING;

        if let Some(stem) = question.stem.as_deref().filter(|s| !s.is_empty()) {
            let stem_width = width - STEM_INDENT;
            ops.push(self.text_op(stem, left + STEM_INDENT, y, BODY_SIZE, stem_width));
            y += self.measure.height_of(stem, stem_width, BODY_SIZE)? + STEM_SPACING;
        }

        match &question.body {
            QuestionBody::MultipleChoice { choices, .. } => {
                let choice_width = width - CHOICE_INDENT;
                for choice in choices {
                    let h = self.measure.height_of(choice, choice_width, BODY_SIZE)?;
                    ops.push(self.text_op(choice, left + CHOICE_INDENT, y, BODY_SIZE, choice_width));
                    y += h + CHOICE_SPACING;
                }
                y = self.plan_answer_lines(&mut ops, y, 1);
            }
            QuestionBody::ShortAnswer => y = self.plan_answer_lines(&mut ops, y, 4),
            QuestionBody::FillBlank => y = self.plan_answer_lines(&mut ops, y, 3),
            QuestionBody::GraphicOrganizer => {
                let box_w = (width - ORGANIZER_GAP) / 2.0;
                let row1 = y + ORGANIZER_PADDING;
                let row2 = row1 + ORGANIZER_BOX_HEIGHT + ORGANIZER_GAP;
                for row in [row1, row2] {
                    for col in 0..2 {
                        ops.push(DrawOp::Frame {
                            x: left + col as f32 * (box_w + ORGANIZER_GAP),
                            y: row,
                            w: box_w,
                            h: ORGANIZER_BOX_HEIGHT,
                        });
                    }
                }
                y = row2 + ORGANIZER_BOX_HEIGHT + ORGANIZER_PADDING;
            }
        }

        ops.push(self.rule_op(y));
        y += SEPARATOR_SPACING;
        Ok(QuestionPlan { ops, bottom: y })
    }

    /// Draws one question at the cursor. A question that would run into the footer
    /// band is moved whole to the next page, unless it already starts at the top.
    /// A question taller than a whole page is cut at the footer band.
    pub fn render_question(&mut self, number: usize, question: &Question) -> Result<f32, RenderError> {
        let mut plan = self.plan_question(question, self.cursor.y)?;
        if plan.bottom > self.cursor.footer_top() && self.cursor.y > TOP_MARGIN {
            debug!(question = number, "question does not fit above footer");
            self.break_page()?;
            plan = self.plan_question(question, self.cursor.y)?;
        }

        let footer_top = self.cursor.footer_top();
        if plan.bottom > footer_top {
            let planned = plan.ops.len();
            let mut kept = Vec::with_capacity(planned);
            for op in plan.ops {
                if self.op_bottom(&op)? <= footer_top {
                    kept.push(op);
                }
            }
            warn!(
                question = number,
                dropped = planned - kept.len(),
                "question taller than a page; cut at footer band"
            );
            plan = QuestionPlan {
                ops: kept,
                bottom: footer_top,
            };
        }

        self.draw_all(&plan.ops)?;
        self.cursor.y = plan.bottom;
        Ok(self.cursor.y)
    }

    /// Question loop with the post-question break policy. Stamps the footer of the
    /// last questions page and returns the answer records in question order.
    pub fn render_questions(&mut self, questions: &[Question]) -> Result<Vec<AnswerRecord>, RenderError> {
        let mut answers = Vec::with_capacity(questions.len());
        for (i, question) in questions.iter().enumerate() {
            let number = i + 1;
            let y = self.render_question(number, question)?;
            if y > self.cursor.break_threshold() && number < questions.len() {
                self.break_page()?;
            }
            answers.push(AnswerRecord::for_question(number, question));
        }
        self.stamp_footer()?;
        Ok(answers)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
