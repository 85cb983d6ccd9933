//! Loading loan tables from CSV and persisting experiment artifacts.

pub mod artifact;
pub mod csv_data;

pub use artifact::{load_json, save_json};
pub use csv_data::{read_frame, read_records, write_records};
