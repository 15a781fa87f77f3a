//! Document Sink — the page device the layout engine draws into.
//!
//! Coordinates handed to a sink are layout coordinates: points from the top-left
//! corner of the page, y growing downward. `PdfSink` flips them into PDF user space.

use pdf_writer::{Content, Finish, Name, Pdf, Rect, Ref, Str};
use thiserror::Error;

use crate::layout::font_metrics::{FontMetricTable, PageConfig, ASCENT, LINE_HEIGHT};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Text measurement failed: {0}")]
    Measurement(String),

    #[error("Document sink failed: {0}")]
    Sink(String),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb(pub f32, pub f32, pub f32);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0.0, 0.0, 0.0);
    /// #111111
    pub const INK: Rgb = Rgb(0.067, 0.067, 0.067);
    /// #888888
    pub const MUTED: Rgb = Rgb(0.533, 0.533, 0.533);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub size: f32,
    pub color: Rgb,
    /// Wrapping / alignment box width.
    pub width: f32,
    pub align: TextAlign,
}

impl TextStyle {
    pub fn left(size: f32, width: f32) -> Self {
        Self {
            size,
            color: Rgb::INK,
            width,
            align: TextAlign::Left,
        }
    }
}

/// A single drawing instruction in layout coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text {
        text: String,
        x: f32,
        y: f32,
        style: TextStyle,
    },
    /// Horizontal rule from `x1` to `x2` at `y`.
    Rule { x1: f32, x2: f32, y: f32 },
    /// Stroked rectangle with its top-left corner at (`x`, `y`).
    Frame { x: f32, y: f32, w: f32, h: f32 },
}

/// The page device. A sink starts with page 1 already open.
pub trait DocumentSink {
    /// Current 1-based page number.
    fn page_number(&self) -> u32;

    /// Closes the current page and opens a new one. Returns the new page number.
    fn add_page(&mut self) -> Result<u32, RenderError>;

    fn draw(&mut self, op: &DrawOp) -> Result<(), RenderError>;
}

// ────────────────────────────────────────────────────────────────────────────
// PDF sink
// ────────────────────────────────────────────────────────────────────────────

const FONT_NAME: Name<'static> = Name(b"F1");

/// Writes pages as uncompressed PDF content streams using `pdf-writer`.
pub struct PdfSink {
    page: PageConfig,
    metrics: &'static FontMetricTable,
    finished_pages: Vec<Content>,
    current: Content,
}

impl PdfSink {
    pub fn new(page: &PageConfig, metrics: &'static FontMetricTable) -> Self {
        Self {
            page: page.clone(),
            metrics,
            finished_pages: Vec::new(),
            current: Content::new(),
        }
    }

    fn to_pdf_y(&self, y: f32) -> f32 {
        self.page.page_height_pt - y
    }

    fn draw_text(&mut self, text: &str, x: f32, y: f32, style: &TextStyle) {
        let line_step = style.size * LINE_HEIGHT;
        let lines = self.metrics.wrap_lines(text, style.width, style.size);

        for (i, line) in lines.iter().enumerate() {
            let line_width = self.metrics.width_of(line, style.size);
            let offset = match style.align {
                TextAlign::Left => 0.0,
                TextAlign::Center => ((style.width - line_width) / 2.0).max(0.0),
                TextAlign::Right => (style.width - line_width).max(0.0),
            };
            let baseline = self.to_pdf_y(y + i as f32 * line_step + style.size * ASCENT);
            let encoded = encode_win_ansi(line);

            let Rgb(r, g, b) = style.color;
            self.current.set_fill_rgb(r, g, b);
            self.current.begin_text();
            self.current.set_font(FONT_NAME, style.size);
            self.current.next_line(x + offset, baseline);
            self.current.show(Str(&encoded));
            self.current.end_text();
        }
    }

    /// Serializes every page into a complete PDF file.
    pub fn finish(mut self) -> Vec<u8> {
        let last = std::mem::replace(&mut self.current, Content::new());
        self.finished_pages.push(last);

        let catalog_id = Ref::new(1);
        let page_tree_id = Ref::new(2);
        let font_id = Ref::new(3);
        let mut next_id = 4;

        let mut pdf = Pdf::new();
        pdf.catalog(catalog_id).pages(page_tree_id);
        pdf.type1_font(font_id)
            .base_font(Name(self.metrics.base_font.as_bytes()))
            .encoding_predefined(Name(b"WinAnsiEncoding"));

        let media_box = Rect::new(0.0, 0.0, self.page.page_width_pt, self.page.page_height_pt);
        let mut page_ids = Vec::with_capacity(self.finished_pages.len());

        for content in self.finished_pages {
            let page_id = Ref::new(next_id);
            let content_id = Ref::new(next_id + 1);
            next_id += 2;

            let mut page = pdf.page(page_id);
            page.media_box(media_box);
            page.parent(page_tree_id);
            page.contents(content_id);
            page.resources().fonts().pair(FONT_NAME, font_id);
            page.finish();

            pdf.stream(content_id, &content.finish());
            page_ids.push(page_id);
        }

        let count = page_ids.len() as i32;
        pdf.pages(page_tree_id).kids(page_ids).count(count);
        pdf.finish()
    }
}

impl DocumentSink for PdfSink {
    fn page_number(&self) -> u32 {
        self.finished_pages.len() as u32 + 1
    }

    fn add_page(&mut self) -> Result<u32, RenderError> {
        let done = std::mem::replace(&mut self.current, Content::new());
        self.finished_pages.push(done);
        Ok(self.page_number())
    }

    fn draw(&mut self, op: &DrawOp) -> Result<(), RenderError> {
        match op {
            DrawOp::Text { text, x, y, style } => self.draw_text(text, *x, *y, style),
            DrawOp::Rule { x1, x2, y } => {
                let pdf_y = self.to_pdf_y(*y);
                self.current.set_stroke_rgb(0.0, 0.0, 0.0);
                self.current.set_line_width(1.0);
                self.current.move_to(*x1, pdf_y);
                self.current.line_to(*x2, pdf_y);
                self.current.stroke();
            }
            DrawOp::Frame { x, y, w, h } => {
                let bottom = self.to_pdf_y(*y + *h);
                self.current.set_stroke_rgb(0.0, 0.0, 0.0);
                self.current.set_line_width(1.0);
                self.current.rect(*x, bottom, *w, *h);
                self.current.stroke();
            }
        }
        Ok(())
    }
}

/// Maps text onto WinAnsiEncoding bytes; unmappable characters become `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            ' '..='~' => c as u8,
            '\u{A0}'..='\u{FF}' => c as u32 as u8,
            '—' => 0x97,
            '–' => 0x96,
            '™' => 0x99,
            '…' => 0x85,
            '‘' => 0x91,
            '’' => 0x92,
            '“' => 0x93,
            '”' => 0x94,
            '•' => 0x95,
            _ => b'?',
        })
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Recording sink (tests)
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
pub mod testing {
    use super::*;
    use crate::layout::font_metrics::TextMeasure;

    /// Keeps every draw call together with the page it landed on.
    #[derive(Debug, Default)]
    pub struct RecordingSink {
        pub pages: u32,
        pub ops: Vec<(u32, DrawOp)>,
        /// When set, drawing on this page fails.
        pub fail_on_page: Option<u32>,
    }

    impl RecordingSink {
        pub fn new() -> Self {
            Self {
                pages: 1,
                ..Self::default()
            }
        }

        /// All text ops as `(page, text, x, y)`.
        pub fn texts(&self) -> Vec<(u32, String, f32, f32)> {
            self.ops
                .iter()
                .filter_map(|(page, op)| match op {
                    DrawOp::Text { text, x, y, .. } => Some((*page, text.clone(), *x, *y)),
                    _ => None,
                })
                .collect()
        }

        pub fn page_of_text(&self, needle: &str) -> Option<u32> {
            self.texts()
                .into_iter()
                .find(|(_, text, _, _)| text == needle)
                .map(|(page, _, _, _)| page)
        }

        pub fn rules_on(&self, page: u32) -> usize {
            self.ops
                .iter()
                .filter(|(p, op)| *p == page && matches!(op, DrawOp::Rule { .. }))
                .count()
        }
    }

    impl DocumentSink for RecordingSink {
        fn page_number(&self) -> u32 {
            self.pages
        }

        fn add_page(&mut self) -> Result<u32, RenderError> {
            self.pages += 1;
            Ok(self.pages)
        }

        fn draw(&mut self, op: &DrawOp) -> Result<(), RenderError> {
            if self.fail_on_page == Some(self.pages) {
                return Err(RenderError::Sink(format!("page {} is read-only", self.pages)));
            }
            self.ops.push((self.pages, op.clone()));
            Ok(())
        }
    }

    /// Every non-empty string measures exactly `line` points tall.
    pub struct FixedMeasure {
        pub line: f32,
    }

    impl TextMeasure for FixedMeasure {
        fn height_of(&self, text: &str, _width: f32, _size: f32) -> Result<f32, RenderError> {
            Ok(if text.is_empty() { 0.0 } else { self.line })
        }

        fn lines_of(&self, text: &str, _width: f32, _size: f32) -> Result<Vec<String>, RenderError> {
            Ok(if text.is_empty() { vec![] } else { vec![text.to_string()] })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::font_metrics::{default_page_config, helvetica};

    #[test]
    fn test_encode_win_ansi_maps_typographic_characters() {
        assert_eq!(encode_win_ansi("A—B"), vec![b'A', 0x97, b'B']);
        assert_eq!(encode_win_ansi("Teach™"), b"Teach\x99".to_vec());
        assert_eq!(encode_win_ansi("日"), b"?".to_vec());
    }

    #[test]
    fn test_pdf_sink_counts_pages() {
        let mut sink = PdfSink::new(&default_page_config(), helvetica());
        assert_eq!(sink.page_number(), 1);
        assert_eq!(sink.add_page().unwrap(), 2);
        assert_eq!(sink.page_number(), 2);
    }

    #[test]
    fn test_pdf_sink_writes_a_pdf_with_every_page() {
        let config = default_page_config();
        let mut sink = PdfSink::new(&config, helvetica());
        sink.draw(&DrawOp::Text {
            text: "Answer Key".to_string(),
            x: 54.0,
            y: 60.0,
            style: TextStyle::left(18.0, config.content_width()),
        })
        .unwrap();
        sink.draw(&DrawOp::Rule {
            x1: 54.0,
            x2: 558.0,
            y: 100.0,
        })
        .unwrap();
        sink.add_page().unwrap();
        sink.draw(&DrawOp::Frame {
            x: 54.0,
            y: 100.0,
            w: 246.0,
            h: 70.0,
        })
        .unwrap();

        let bytes = sink.finish();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.starts_with("%PDF-"));
        assert!(text.contains("/Count 2"));
        assert!(text.contains("(Answer Key) Tj"));
        assert!(text.contains("/Helvetica"));
    }
}
