//! Static font metrics for the worksheet base font (Helvetica, PDF standard 14).
//!
//! Character widths are in em units (relative to font size), taken from the Adobe
//! Helvetica AFM. They drive both the Text Measurement Adapter used by the layout
//! engine and the line wrapping done by the PDF sink, so measured heights and drawn
//! lines always agree.
//! The table covers ASCII 0x20..=0x7E (95 printable characters).
//! Index = (char as usize) - 32.

use serde::{Deserialize, Serialize};

use crate::layout::sink::RenderError;

/// Line height as a multiple of the font size (Helvetica ascender − descender + gap).
pub const LINE_HEIGHT: f32 = 1.156;
/// Baseline offset below the top of a line, as a multiple of the font size.
pub const ASCENT: f32 = 0.718;

// ────────────────────────────────────────────────────────────────────────────
// Page configuration
// ────────────────────────────────────────────────────────────────────────────

/// Page geometry for a worksheet, in PDF points (1/72").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageConfig {
    pub page_width_pt: f32,
    pub page_height_pt: f32,
    /// Left/right margin; the top of the content area is fixed by the engine.
    pub margin_pt: f32,
}

impl PageConfig {
    pub fn content_width(&self) -> f32 {
        self.page_width_pt - 2.0 * self.margin_pt
    }
}

/// US letter (8.5" × 11") with 0.75" side margins.
pub fn default_page_config() -> PageConfig {
    PageConfig {
        page_width_pt: 612.0,
        page_height_pt: 792.0,
        margin_pt: 54.0,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Measurement capability
// ────────────────────────────────────────────────────────────────────────────

/// Text Measurement Adapter: rendered height of `text` wrapped at `width` points.
pub trait TextMeasure {
    fn height_of(&self, text: &str, width: f32, font_size: f32) -> Result<f32, RenderError>;

    /// The lines `text` wraps into at `width`. Joining them with `\n` and measuring
    /// again yields the same lines.
    fn lines_of(&self, text: &str, width: f32, font_size: f32) -> Result<Vec<String>, RenderError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Font metric table
// ────────────────────────────────────────────────────────────────────────────

/// Static character-width table for a standard PDF font.
///
/// `widths[i]` = width of ASCII character `(i + 32)` at 1em.
pub struct FontMetricTable {
    /// PostScript name written into the PDF font dictionary.
    pub base_font: &'static str,
    widths: [f32; 95],
    /// Fallback width for characters outside the table.
    pub average_char_width: f32,
    pub space_width: f32,
}

impl FontMetricTable {
    fn char_width(&self, c: char) -> f32 {
        let code = c as usize;
        if (32..=126).contains(&code) {
            return self.widths[code - 32];
        }
        match c {
            '—' | '™' | '…' => 1.0,
            _ => self.average_char_width,
        }
    }

    /// Measures the rendered width of a string in em units.
    pub fn measure_str(&self, s: &str) -> f32 {
        s.chars().map(|c| self.char_width(c)).sum()
    }

    /// Width of `s` in points at `font_size`.
    pub fn width_of(&self, s: &str, font_size: f32) -> f32 {
        self.measure_str(s) * font_size
    }

    /// Greedy word-wrap of `text` into lines no wider than `width` points.
    ///
    /// Explicit newlines start a new line. A single word wider than the line is kept
    /// whole on its own line. Empty text yields no lines.
    pub fn wrap_lines(&self, text: &str, width: f32, font_size: f32) -> Vec<String> {
        if text.is_empty() {
            return vec![];
        }
        let max_width = width / font_size;
        let mut lines = Vec::new();

        for paragraph in text.split('\n') {
            let mut current = String::new();
            let mut current_width = 0.0_f32;

            for word in paragraph.split_whitespace() {
                let word_w = self.measure_str(word);
                if current.is_empty() {
                    current.push_str(word);
                    current_width = word_w;
                } else if current_width + self.space_width + word_w > max_width {
                    lines.push(std::mem::take(&mut current));
                    current.push_str(word);
                    current_width = word_w;
                } else {
                    current.push(' ');
                    current.push_str(word);
                    current_width += self.space_width + word_w;
                }
            }
            lines.push(current);
        }
        lines
    }
}

fn check_box(width: f32, font_size: f32) -> Result<(), RenderError> {
    if width.is_finite() && width > 0.0 && font_size.is_finite() && font_size > 0.0 {
        return Ok(());
    }
    Err(RenderError::Measurement(format!(
        "cannot measure text at width {width} and size {font_size}"
    )))
}

impl TextMeasure for FontMetricTable {
    fn height_of(&self, text: &str, width: f32, font_size: f32) -> Result<f32, RenderError> {
        let lines = self.lines_of(text, width, font_size)?.len();
        Ok(lines as f32 * font_size * LINE_HEIGHT)
    }

    fn lines_of(&self, text: &str, width: f32, font_size: f32) -> Result<Vec<String>, RenderError> {
        check_box(width, font_size)?;
        Ok(self.wrap_lines(text, width, font_size))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Static width table
// ────────────────────────────────────────────────────────────────────────────

static HELVETICA_TABLE: FontMetricTable = FontMetricTable {
    base_font: "Helvetica",
    #[rustfmt::skip]
    widths: [
        // sp     !      "      #      $      %      &      '      (      )      *      +      ,      -      .      /
        0.278, 0.278, 0.355, 0.556, 0.556, 0.889, 0.667, 0.191, 0.333, 0.333, 0.389, 0.584, 0.278, 0.333, 0.278, 0.278,
        // 0      1      2      3      4      5      6      7      8      9
        0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556, 0.556,
        // :      ;      <      =      >      ?      @
        0.278, 0.278, 0.584, 0.584, 0.584, 0.556, 1.015,
        // A      B      C      D      E      F      G      H      I      J      K      L      M
        0.667, 0.667, 0.722, 0.722, 0.667, 0.611, 0.778, 0.722, 0.278, 0.500, 0.667, 0.556, 0.833,
        // N      O      P      Q      R      S      T      U      V      W      X      Y      Z
        0.722, 0.778, 0.667, 0.778, 0.722, 0.667, 0.611, 0.722, 0.667, 0.944, 0.667, 0.667, 0.611,
        // [      \      ]      ^      _      `
        0.278, 0.278, 0.278, 0.469, 0.556, 0.333,
        // a      b      c      d      e      f      g      h      i      j      k      l      m
        0.556, 0.556, 0.500, 0.556, 0.556, 0.278, 0.556, 0.556, 0.222, 0.222, 0.500, 0.222, 0.833,
        // n      o      p      q      r      s      t      u      v      w      x      y      z
        0.556, 0.556, 0.556, 0.556, 0.333, 0.500, 0.278, 0.556, 0.500, 0.722, 0.500, 0.500, 0.500,
        // {      |      }      ~
        0.334, 0.260, 0.334, 0.584,
    ],
    average_char_width: 0.556,
    space_width: 0.278,
};

/// Returns the metric table for the worksheet base font.
pub fn helvetica() -> &'static FontMetricTable {
    &HELVETICA_TABLE
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measure_str_empty_returns_zero() {
        assert_eq!(helvetica().measure_str(""), 0.0);
    }

    #[test]
    fn test_measure_str_ascii_characters() {
        // "Rust" = R(0.722) + u(0.556) + s(0.500) + t(0.278) = 2.056
        let width = helvetica().measure_str("Rust");
        assert!(
            (width - 2.056).abs() < 1e-3,
            "Rust width should be ~2.056, got {width}"
        );
    }

    #[test]
    fn test_measure_str_non_ascii_falls_back() {
        let metrics = helvetica();
        let width = metrics.measure_str("é");
        assert!((width - metrics.average_char_width).abs() < 1e-4);
        assert!((metrics.measure_str("—") - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_wrap_lines_short_text_is_one_line() {
        let lines = helvetica().wrap_lines("Practice Item", 504.0, 11.0);
        assert_eq!(lines, vec!["Practice Item".to_string()]);
    }

    #[test]
    fn test_wrap_lines_long_text_wraps() {
        let text = "word ".repeat(60);
        let lines = helvetica().wrap_lines(&text, 504.0, 11.0);
        assert!(lines.len() >= 2, "expected wrapping, got {lines:?}");
        for line in &lines {
            assert!(helvetica().width_of(line, 11.0) <= 504.0);
        }
    }

    #[test]
    fn test_wrap_lines_honours_newlines_and_empty_text() {
        assert!(helvetica().wrap_lines("", 504.0, 11.0).is_empty());
        assert_eq!(helvetica().wrap_lines("one\ntwo", 504.0, 11.0).len(), 2);
    }

    #[test]
    fn test_height_of_scales_with_line_count() {
        let metrics = helvetica();
        let one = metrics.height_of("Hi", 504.0, 10.0).unwrap();
        assert!((one - 11.56).abs() < 1e-3);
        let two = metrics.height_of("Hi\nthere", 504.0, 10.0).unwrap();
        assert!((two - 2.0 * one).abs() < 1e-3);
        assert_eq!(metrics.height_of("", 504.0, 10.0).unwrap(), 0.0);
    }

    #[test]
    fn test_lines_of_rewraps_to_same_lines() {
        let metrics = helvetica();
        let text = "Read every passage carefully and answer. ".repeat(20);
        let lines = metrics.lines_of(&text, 504.0, 13.0).unwrap();
        assert!(lines.len() > 3);
        let chunk = lines[1..3].join("\n");
        assert_eq!(metrics.lines_of(&chunk, 504.0, 13.0).unwrap(), lines[1..3].to_vec());
    }

    #[test]
    fn test_height_of_rejects_degenerate_width() {
        let result = helvetica().height_of("Hi", 0.0, 10.0);
        assert!(matches!(result, Err(RenderError::Measurement(_))));
    }

    #[test]
    fn test_default_page_config_is_letter() {
        let config = default_page_config();
        assert_eq!(config.page_width_pt, 612.0);
        assert_eq!(config.page_height_pt, 792.0);
        assert_eq!(config.content_width(), 504.0);
    }
}
