//! Tests for row acceptance

use crate::app::models::TranscriptRow;
use crate::app::services::normalizers::{ModuleIdExtractor, TitlePatternExtractor};
use crate::app::services::reconciler::filter::{count_unique_titles, count_unique_users};
use crate::app::services::reconciler::filter_rows;
use crate::config::StatusPolicy;

fn row(number: usize, user: &str, title: &str, status: &str) -> TranscriptRow {
    TranscriptRow {
        row_number: number,
        user_id: (!user.is_empty()).then(|| user.to_string()),
        module_title: (!title.is_empty()).then(|| title.to_string()),
        status: (!status.is_empty()).then(|| status.to_string()),
        ..Default::default()
    }
}

fn sample_rows() -> Vec<TranscriptRow> {
    vec![
        row(1, "U001", "MÓDULO 1.1 - Inducción", "Terminado"),
        row(2, "U002", "Generic Training", "Completado"),
        row(3, "U002", "MÓDULO 1.2 - Seguridad", "aprobado"),
        row(4, "U003", "MÓDULO 1.3 - Cultura", ""),
        row(5, "U003", "Modulo 1.2 Seguridad", "Registrado"),
        row(6, "U004", "", "Completado"),
    ]
}

#[test]
fn test_strict_policy_requires_platform_status() {
    let accepted = filter_rows(sample_rows(), StatusPolicy::Strict, &TitlePatternExtractor);

    let numbers: Vec<usize> = accepted.iter().map(|a| a.row.row_number).collect();
    assert_eq!(numbers, vec![1, 5]);
    assert_eq!(accepted[0].module_id, 1);
    assert_eq!(accepted[1].module_id, 2);
}

#[test]
fn test_lenient_policy_only_requires_module_id() {
    let accepted = filter_rows(sample_rows(), StatusPolicy::Lenient, &TitlePatternExtractor);

    let numbers: Vec<usize> = accepted.iter().map(|a| a.row.row_number).collect();
    assert_eq!(numbers, vec![1, 3, 4, 5]);
}

#[test]
fn test_unique_counts() {
    let accepted = filter_rows(sample_rows(), StatusPolicy::Lenient, &TitlePatternExtractor);

    assert_eq!(count_unique_users(&accepted), 3);
    // Two spellings of module 2 count as two titles
    assert_eq!(count_unique_titles(&accepted), 4);
}

#[test]
fn test_custom_extractor() {
    struct CodeSuffix;
    impl ModuleIdExtractor for CodeSuffix {
        fn extract(&self, title: &str) -> Option<u32> {
            title.rsplit('#').next()?.trim().parse().ok()
        }
    }

    let rows = vec![
        row(1, "U001", "Onboarding #40", "Completado"),
        row(2, "U001", "MÓDULO 1.1", "Completado"),
    ];
    let accepted = filter_rows(rows, StatusPolicy::Strict, &CodeSuffix);

    assert_eq!(accepted.len(), 1);
    assert_eq!(accepted[0].module_id, 40);
}

#[test]
fn test_empty_input() {
    assert!(filter_rows(Vec::new(), StatusPolicy::Strict, &TitlePatternExtractor).is_empty());
}
