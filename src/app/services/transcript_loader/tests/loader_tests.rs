//! Tests for transcript loading from files

use std::io::Write;
use std::path::Path;

use super::*;
use crate::app::models::CellValue;
use crate::app::services::transcript_loader::reader::{cell_from_spreadsheet, read_csv_grid};
use crate::app::services::transcript_loader::{RawTable, SourceFormat, TranscriptLoader};
use crate::config::ReconcilerConfig;
use crate::Error;

fn loader() -> TranscriptLoader {
    TranscriptLoader::new(&ReconcilerConfig::default())
}

#[test]
fn test_header_detection_across_noise_depths() {
    for noise in [0, 3, 19] {
        let temp_file = create_temp_csv(&transcript_csv(noise, SPANISH_HEADER, DATA_ROWS));
        let transcript = loader().load(temp_file.path()).unwrap();

        assert_eq!(transcript.header_offset, noise, "noise rows: {noise}");
        assert_eq!(transcript.rows.len(), 3);
        // First data row is the row immediately after the header
        assert_eq!(transcript.rows[0].user_id.as_deref(), Some("U001"));
        assert_eq!(
            transcript.rows[0].module_title.as_deref(),
            Some("MÓDULO 1.1 - Inducción")
        );
    }
}

#[test]
fn test_header_beyond_preview_falls_back_to_row_zero() {
    let temp_file = create_temp_csv(&transcript_csv(25, ENGLISH_HEADER, DATA_ROWS));

    let offset = loader().find_header_offset(temp_file.path()).unwrap();
    assert_eq!(offset, 0);

    // Row 0 is a noise line, so the required columns cannot be found
    let err = loader().load(temp_file.path()).unwrap_err();
    assert!(matches!(err, Error::MissingColumns { .. }));
}

#[test]
fn test_preview_window_is_configurable() {
    let temp_file = create_temp_csv(&transcript_csv(25, ENGLISH_HEADER, DATA_ROWS));
    let config = ReconcilerConfig::default().with_header_preview_rows(30);
    let transcript = TranscriptLoader::new(&config).load(temp_file.path()).unwrap();

    assert_eq!(transcript.header_offset, 25);
    assert_eq!(transcript.rows.len(), 3);
}

#[test]
fn test_loaded_rows_carry_raw_values() {
    let temp_file = create_temp_csv(&transcript_csv(2, ENGLISH_HEADER, DATA_ROWS));
    let transcript = loader().load(temp_file.path()).unwrap();

    let second = &transcript.rows[1];
    assert_eq!(second.row_number, 2);
    assert_eq!(second.user_name.as_deref(), Some("Luis Pérez"));
    assert_eq!(second.status.as_deref(), Some("En Progreso"));
    assert_eq!(second.start_date, CellValue::Text("2024-04-01".to_string()));
    assert_eq!(second.end_date, CellValue::Empty);
    assert_eq!(second.provider, None);
}

#[test]
fn test_blank_rows_are_skipped_but_numbering_is_kept() {
    let content = format!(
        "{}\n{}\n,,,,,,,\n{}\n",
        ENGLISH_HEADER, DATA_ROWS[0], DATA_ROWS[1]
    );
    let temp_file = create_temp_csv(&content);
    let transcript = loader().load(temp_file.path()).unwrap();

    assert_eq!(transcript.rows.len(), 2);
    assert_eq!(transcript.rows[0].row_number, 1);
    assert_eq!(transcript.rows[1].row_number, 3);
}

#[test]
fn test_byte_order_mark_is_stripped() {
    let content = format!("\u{feff}{}\n{}\n", ENGLISH_HEADER, DATA_ROWS[0]);
    let temp_file = create_temp_csv(&content);
    let transcript = loader().load(temp_file.path()).unwrap();

    assert_eq!(transcript.mapping.original[0], "User ID");
    assert_eq!(transcript.rows[0].user_id.as_deref(), Some("U001"));
}

#[test]
fn test_missing_file_is_fatal_load_error() {
    let err = loader()
        .load(Path::new("/nonexistent/transcript.csv"))
        .unwrap_err();
    assert!(err.is_fatal_load());
}

#[test]
fn test_unreadable_spreadsheet_is_fatal_load_error() {
    let mut temp_file = tempfile::Builder::new().suffix(".xlsx").tempfile().unwrap();
    write!(temp_file, "this is not a workbook").unwrap();

    let err = loader().load(temp_file.path()).unwrap_err();
    assert!(matches!(err, Error::Spreadsheet { .. }));
}

#[test]
fn test_non_utf8_export_is_rejected() {
    let mut temp_file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    temp_file.write_all(ENGLISH_HEADER.as_bytes()).unwrap();
    // Windows-1252 encoded "MÓDULO 1.2" (0xD3 is Ó)
    temp_file
        .write_all(b"\nU001,Ana,M\xD3DULO 1.2 - Seguridad,,,Completado,,\n")
        .unwrap();
    temp_file.flush().unwrap();

    let err = loader().load(temp_file.path()).unwrap_err();

    assert!(err.is_fatal_load());
    match err {
        Error::CsvParsing { message, .. } => assert!(message.contains("Invalid UTF-8 in record 2")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_csv_preview_limit() {
    let temp_file = create_temp_csv(&transcript_csv(10, ENGLISH_HEADER, DATA_ROWS));
    let preview = read_csv_grid(temp_file.path(), Some(4)).unwrap();
    let full = read_csv_grid(temp_file.path(), None).unwrap();

    assert_eq!(preview.len(), 4);
    assert_eq!(full.len(), 14);
}

#[test]
fn test_raw_table_split() {
    let grid = vec![
        vec![CellValue::from_text("noise")],
        vec![CellValue::from_text("User ID"), CellValue::Empty],
        vec![CellValue::from_text("U1"), CellValue::Number(3.0)],
    ];
    let table = RawTable::from_grid(grid.clone(), 1);
    assert_eq!(table.headers, vec!["User ID".to_string(), String::new()]);
    assert_eq!(table.rows.len(), 1);
    assert_eq!(table.rows[0][1], CellValue::Number(3.0));

    assert_eq!(RawTable::from_grid(grid, 5), RawTable::default());
}

#[test]
fn test_source_format_from_extension() {
    assert_eq!(SourceFormat::from_path(Path::new("a.csv")), SourceFormat::Csv);
    assert_eq!(SourceFormat::from_path(Path::new("a.CSV")), SourceFormat::Csv);
    assert_eq!(
        SourceFormat::from_path(Path::new("a.xlsx")),
        SourceFormat::Spreadsheet
    );
    assert_eq!(
        SourceFormat::from_path(Path::new("noext")),
        SourceFormat::Spreadsheet
    );
}

#[test]
fn test_spreadsheet_cell_conversion() {
    use calamine::Data;

    assert_eq!(cell_from_spreadsheet(&Data::Empty), CellValue::Empty);
    assert_eq!(
        cell_from_spreadsheet(&Data::String(" Usuario ".to_string())),
        CellValue::Text("Usuario".to_string())
    );
    assert_eq!(cell_from_spreadsheet(&Data::Int(42)), CellValue::Number(42.0));
    assert_eq!(
        cell_from_spreadsheet(&Data::Float(45366.0)),
        CellValue::Number(45366.0)
    );
    assert_eq!(cell_from_spreadsheet(&Data::Bool(false)), CellValue::Bool(false));
    assert_eq!(
        cell_from_spreadsheet(&Data::DateTimeIso("2024-03-15T00:00:00".to_string())),
        CellValue::Text("2024-03-15T00:00:00".to_string())
    );
}
