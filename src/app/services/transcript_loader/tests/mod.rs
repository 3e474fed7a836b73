//! Test utilities for the transcript loader
//!
//! Helpers for building transcript exports with configurable noise rows above
//! the header, in the shape the training platform produces them.

use std::io::Write;

use tempfile::NamedTempFile;

mod loader_tests;

/// Spanish header row as exported by the platform
pub const SPANISH_HEADER: &str = "Identificación de usuario,Nombre completo del usuario,Título de la capacitación,Tipo de capacitación,Proveedor de capacitación,Estado del expediente,Fecha de inicio de la capacitación,Fecha de finalización de expediente";

/// English header row as exported by the platform
pub const ENGLISH_HEADER: &str = "User ID,User Name,Training Title,Training Type,Training Provider,Transcript Status,Training Start Date,Transcript Completed Date";

/// Data rows matching either header
pub const DATA_ROWS: &[&str] = &[
    "U001,Ana López,MÓDULO 1.1 - Inducción,Curso en línea,Instituto HP,Completado,15/03/2024,20/03/2024",
    "U002,Luis Pérez,MÓDULO 1.2 - Seguridad,Curso en línea,,En Progreso,2024-04-01,",
    "U001,Ana López,MÓDULO 1.2 - Seguridad,Curso en línea,,Registrado,,",
];

/// Build CSV content with `noise_rows` report rows above the header
pub fn transcript_csv(noise_rows: usize, header: &str, rows: &[&str]) -> String {
    let mut content = String::new();
    for i in 0..noise_rows {
        content.push_str(&format!("Reporte de estado de transcripción - línea {}\n", i + 1));
    }
    content.push_str(header);
    content.push('\n');
    for row in rows {
        content.push_str(row);
        content.push('\n');
    }
    content
}

/// Helper to create a temporary CSV file with given content
pub fn create_temp_csv(content: &str) -> NamedTempFile {
    let mut temp_file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
    write!(temp_file, "{}", content).unwrap();
    temp_file.flush().unwrap();
    temp_file
}
