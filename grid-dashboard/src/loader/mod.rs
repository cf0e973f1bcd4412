pub mod csv_file;

pub use csv_file::{load_readings, load_readings_with_delimiter, REQUIRED_COLUMNS};
