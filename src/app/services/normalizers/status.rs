//! Status normalization
//!
//! The platform emits a handful of literal status values; hand-edited exports
//! and older report versions use English or Spanish variants. Normalization
//! tries the literal table first, then a substring search over synonyms, and
//! defaults to not started.

use tracing::warn;

use crate::app::models::Status;

/// Literal values emitted by the platform
const EXACT_STATUSES: &[(&str, Status)] = &[
    ("Terminado", Status::Completed),
    ("Completado", Status::Completed),
    ("Completed", Status::Completed),
    ("En Progreso", Status::InProgress),
    ("En progreso", Status::InProgress),
    ("En proceso", Status::InProgress),
    ("In Progress", Status::InProgress),
    ("Registrado", Status::Registered),
    ("Registered", Status::Registered),
    ("No iniciado", Status::NotStarted),
    ("No Iniciado", Status::NotStarted),
    ("Not Started", Status::NotStarted),
];

/// Lower-case synonyms searched as substrings, in order.
///
/// Negative phrases come before the positive words they contain.
const STATUS_SYNONYMS: &[(&str, Status)] = &[
    ("no iniciado", Status::NotStarted),
    ("sin iniciar", Status::NotStarted),
    ("not started", Status::NotStarted),
    ("pendiente", Status::NotStarted),
    ("pending", Status::NotStarted),
    ("incomplet", Status::InProgress),
    ("terminado", Status::Completed),
    ("completado", Status::Completed),
    ("completed", Status::Completed),
    ("complete", Status::Completed),
    ("finalizado", Status::Completed),
    ("aprobado", Status::Completed),
    ("passed", Status::Completed),
    ("en progreso", Status::InProgress),
    ("en proceso", Status::InProgress),
    ("in progress", Status::InProgress),
    ("iniciado", Status::InProgress),
    ("started", Status::InProgress),
    ("registrado", Status::Registered),
    ("registered", Status::Registered),
    ("inscrito", Status::Registered),
    ("enrolled", Status::Registered),
];

/// Look up a status among the literal values the platform emits
pub fn exact_status(raw: &str) -> Option<Status> {
    let trimmed = raw.trim();
    EXACT_STATUSES
        .iter()
        .find(|(literal, _)| *literal == trimmed)
        .map(|(_, status)| *status)
}

/// Normalize raw status text; absent, blank and unrecognized values are not started
pub fn normalize_status(raw: Option<&str>) -> Status {
    let Some(raw) = raw else {
        return Status::NotStarted;
    };

    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Status::NotStarted;
    }

    if let Some(status) = exact_status(trimmed) {
        return status;
    }

    let lowered = trimmed.to_lowercase();
    if let Some((_, status)) = STATUS_SYNONYMS
        .iter()
        .find(|(synonym, _)| lowered.contains(synonym))
    {
        return *status;
    }

    warn!("Unrecognized status '{}'; defaulting to {}", trimmed, Status::NotStarted);
    Status::NotStarted
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[test]
    fn test_completed_variants() {
        for raw in ["Terminado", "Completed", "COMPLETADO", "aprobado"] {
            assert_eq!(normalize_status(Some(raw)), Status::Completed, "{raw}");
        }
    }

    #[test]
    fn test_absent_and_blank_are_not_started() {
        assert_eq!(normalize_status(None), Status::NotStarted);
        assert_eq!(normalize_status(Some("")), Status::NotStarted);
        assert_eq!(normalize_status(Some("   ")), Status::NotStarted);
    }

    #[traced_test]
    #[test]
    fn test_unrecognized_defaults_to_not_started() {
        assert_eq!(normalize_status(Some("Cancelado")), Status::NotStarted);
        assert_eq!(normalize_status(Some("???")), Status::NotStarted);

        assert!(logs_contain("Unrecognized status 'Cancelado'"));
        assert!(logs_contain("Unrecognized status '???'"));
    }

    #[traced_test]
    #[test]
    fn test_blank_and_known_statuses_do_not_warn() {
        assert_eq!(normalize_status(None), Status::NotStarted);
        assert_eq!(normalize_status(Some("  ")), Status::NotStarted);
        assert_eq!(normalize_status(Some("aprobado")), Status::Completed);

        assert!(!logs_contain("Unrecognized status"));
    }

    #[test]
    fn test_negative_phrases_win_over_contained_words() {
        assert_eq!(normalize_status(Some("no iniciado")), Status::NotStarted);
        assert_eq!(normalize_status(Some("NOT STARTED")), Status::NotStarted);
        assert_eq!(normalize_status(Some("Incomplete")), Status::InProgress);
    }

    #[test]
    fn test_other_categories() {
        assert_eq!(normalize_status(Some("En Progreso")), Status::InProgress);
        assert_eq!(normalize_status(Some("started")), Status::InProgress);
        assert_eq!(normalize_status(Some("Inscrito")), Status::Registered);
        assert_eq!(normalize_status(Some("Enrolled")), Status::Registered);
        assert_eq!(normalize_status(Some("Pendiente")), Status::NotStarted);
    }

    #[test]
    fn test_exact_stage_only_accepts_platform_literals() {
        assert_eq!(exact_status("Terminado"), Some(Status::Completed));
        assert_eq!(exact_status(" Registrado "), Some(Status::Registered));
        assert_eq!(exact_status("No iniciado"), Some(Status::NotStarted));
        assert_eq!(exact_status("COMPLETADO"), None);
        assert_eq!(exact_status("aprobado"), None);
        assert_eq!(exact_status(""), None);
    }
}
