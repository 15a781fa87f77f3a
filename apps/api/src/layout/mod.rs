// Worksheet page layout: text measurement, a pagination cursor with footer stamping,
// and the PDF drawing sink. Rendering is CPU-bound and must run inside
// tokio::task::spawn_blocking.

pub mod answer_key;
pub mod engine;
pub mod font_metrics;
pub mod sink;

// Re-export the public API consumed by other modules (generator, handlers).
pub use font_metrics::{default_page_config, PageConfig};
