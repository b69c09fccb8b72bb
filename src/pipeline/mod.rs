//! Pipeline entry points for harvester operations.
//!
//! - `run_scraper`: harvest all configured projects
//! - `run_validate`: check produced output files

pub mod scrape;
pub mod validate;

pub use scrape::{output_path, run_scraper, ScrapeStats};
pub use validate::{run_validate, validate_file, FileReport, ValidationReport};
