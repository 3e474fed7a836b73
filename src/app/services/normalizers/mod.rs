//! Value normalizers for transcript fields
//!
//! Pure functions that turn free-form export values into the closed
//! vocabularies the store expects. None of them fail: unrecognized input is
//! defaulted or passed through.
//!
//! - [`status`] - Status text to [`Status`](crate::app::models::Status)
//! - [`dates`] - Spreadsheet serials and text dates to ISO dates
//! - [`module_id`] - Module number extraction from free-text titles
//! - [`category`] - Keyword categorisation of module titles

pub mod category;
pub mod dates;
pub mod module_id;
pub mod status;

// Re-export main functions for easy access
pub use category::{ModuleCategory, categorize_module};
pub use dates::normalize_date;
pub use module_id::{ModuleIdExtractor, TitlePatternExtractor, extract_module_id};
pub use status::{exact_status, normalize_status};
