//! Header row detection
//!
//! The export places report titles, run dates and filter descriptions above
//! the column header. The header is the first row holding a cell that contains
//! one of the known header markers.

use crate::app::models::CellValue;

/// Find the header row within `preview`.
///
/// Returns the 0-based offset of the first row with a cell containing any of
/// `markers`, or `None` when no row in the preview matches. Markers are
/// matched case-sensitively; blank markers are ignored.
pub fn detect_header_row<M: AsRef<str>>(preview: &[Vec<CellValue>], markers: &[M]) -> Option<usize> {
    preview.iter().position(|row| {
        row.iter().any(|cell| {
            markers
                .iter()
                .map(AsRef::as_ref)
                .filter(|marker| !marker.is_empty())
                .any(|marker| cell.contains(marker))
        })
    })
}
