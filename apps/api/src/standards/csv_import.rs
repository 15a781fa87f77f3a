//! Spreadsheet export → standards pack conversion.
//!
//! The first row is the header. Columns are mapped by header name; the code and
//! statement columns are mandatory, grades and tags are optional multi-value fields.

use chrono::Utc;
use serde::Deserialize;
use tracing::warn;

use crate::errors::AppError;
use crate::standards::models::{Framework, Standard, StandardsPack};

const DEFAULT_MULTI_DELIMITER: &str = "|";

/// Splits delimiter-separated text into rows of fields.
///
/// Quoted fields may contain the delimiter and line breaks; `""` inside quotes is a
/// literal quote. Rows end at `\n`, `\r` or `\r\n`. Blank lines produce no row.
pub fn parse_csv(text: &str, delimiter: char) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                field.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            c if c == delimiter && !in_quotes => row.push(std::mem::take(&mut field)),
            '\n' | '\r' if !in_quotes => {
                if !field.is_empty() || !row.is_empty() {
                    row.push(std::mem::take(&mut field));
                    rows.push(std::mem::take(&mut row));
                }
                if c == '\r' && chars.peek() == Some(&'\n') {
                    chars.next();
                }
            }
            c => field.push(c),
        }
    }
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }
    rows
}

/// Header names of the source columns. Grades and tags may be left unmapped.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CsvColumnMapping {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub statement: String,
    #[serde(default)]
    pub grades: Option<String>,
    #[serde(default)]
    pub tags: Option<String>,
    #[serde(default)]
    pub grades_delimiter: Option<String>,
    #[serde(default)]
    pub tags_delimiter: Option<String>,
}

/// Pack and framework metadata. Blank or missing values take the defaults below.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackMetadata {
    pub pack_id: Option<String>,
    pub pack_name: Option<String>,
    pub version: Option<String>,
    pub scope: Option<String>,
    pub framework_id: Option<String>,
    pub framework_name: Option<String>,
    /// Comma-separated.
    pub subjects: Option<String>,
    /// Comma-separated.
    pub grade_bands: Option<String>,
}

fn or_default(value: &Option<String>, default: &str) -> String {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or(default)
        .to_string()
}

fn split_list(value: &str, delimiter: &str) -> Vec<String> {
    value
        .split(delimiter)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn multi_delimiter(value: &Option<String>) -> String {
    or_default(value, DEFAULT_MULTI_DELIMITER)
}

fn column_index(headers: &[String], name: &str) -> Option<usize> {
    headers.iter().position(|h| h.trim() == name.trim())
}

fn required_column(headers: &[String], name: &str, label: &str) -> Result<usize, AppError> {
    if name.trim().is_empty() {
        return Err(AppError::Validation(format!("Map the {label} column.")));
    }
    column_index(headers, name)
        .ok_or_else(|| AppError::Validation(format!("Unknown {label} column '{name}'")))
}

/// Builds a single-framework pack from CSV text.
pub fn convert_csv(
    text: &str,
    delimiter: char,
    mapping: &CsvColumnMapping,
    meta: &PackMetadata,
) -> Result<StandardsPack, AppError> {
    let mut rows = parse_csv(text, delimiter).into_iter();
    let headers = rows.next().unwrap_or_default();

    let code_idx = required_column(&headers, &mapping.code, "Code")?;
    let statement_idx = required_column(&headers, &mapping.statement, "Description")?;
    let grades_idx = mapping.grades.as_deref().and_then(|g| column_index(&headers, g));
    let tags_idx = mapping.tags.as_deref().and_then(|t| column_index(&headers, t));
    let grades_delim = multi_delimiter(&mapping.grades_delimiter);
    let tags_delim = multi_delimiter(&mapping.tags_delimiter);

    let cell = |row: &[String], idx: usize| {
        row.get(idx).map(|v| v.trim().to_string()).unwrap_or_default()
    };
    let list = |row: &[String], idx: Option<usize>, delim: &str| {
        idx.map(|i| split_list(&cell(row, i), delim)).unwrap_or_default()
    };

    let mut standards = Vec::new();
    for (line, row) in rows.enumerate() {
        let row = row.as_slice();
        let code = cell(row, code_idx);
        let statement = cell(row, statement_idx);
        if code.is_empty() || statement.is_empty() {
            // +2: one for the header, one for 1-based numbering
            warn!(row = line + 2, "dropping CSV row without code or statement");
            continue;
        }
        standards.push(Standard {
            code,
            statement,
            grades: list(row, grades_idx, grades_delim.as_str()),
            tags: list(row, tags_idx, tags_delim.as_str()),
        });
    }

    let today = Utc::now().format("%Y-%m-%d").to_string();
    Ok(StandardsPack {
        id: or_default(&meta.pack_id, "state-pack"),
        name: or_default(&meta.pack_name, "State Standards Pack"),
        version: or_default(&meta.version, &today),
        scope: or_default(&meta.scope, "state"),
        frameworks: vec![Framework {
            id: or_default(&meta.framework_id, "state-fw"),
            name: or_default(&meta.framework_name, "State Framework"),
            subjects: split_list(&or_default(&meta.subjects, "ELA"), ","),
            grade_bands: split_list(&or_default(&meta.grade_bands, "K-2,3-5,6-8,9-10,11-12"), ","),
            standards,
        }],
    })
}
