pub mod csv_import;
pub mod handlers;
pub mod models;
pub mod registry;
pub mod samples;
pub mod selection;
