//! Module identifier extraction
//!
//! Module identity is derived from the title text ("MÓDULO 1.7 - Seguridad"
//! is module 7). Titles that do not follow the pattern have no module id and
//! are excluded from reconciliation. The reconciler only depends on
//! [`ModuleIdExtractor`], so a structured id scheme can replace the pattern.

use std::sync::OnceLock;

use regex::Regex;

/// Maps a module title to its natural key
pub trait ModuleIdExtractor {
    /// Positive module id for `title`, or `None` when the title carries none
    fn extract(&self, title: &str) -> Option<u32>;
}

/// Extracts the number following "MÓDULO 1." (or an unaccented or English spelling)
#[derive(Debug, Clone, Copy, Default)]
pub struct TitlePatternExtractor;

impl ModuleIdExtractor for TitlePatternExtractor {
    fn extract(&self, title: &str) -> Option<u32> {
        extract_module_id(Some(title))
    }
}

// Accepts precomposed and combining-accent forms of "ó"
fn re_module_id() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)m(?:ó|o\x{301}?)dul[oe]\s+1\.(\d+)").expect("module id pattern is valid")
    })
}

/// Extract the module id from a title; absent, unmatched and zero ids yield `None`
pub fn extract_module_id(title: Option<&str>) -> Option<u32> {
    let captures = re_module_id().captures(title?)?;
    let id: u32 = captures.get(1)?.as_str().parse().ok()?;
    (id > 0).then_some(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accented_marker() {
        assert_eq!(extract_module_id(Some("MÓDULO 1.7 - Seguridad")), Some(7));
        assert_eq!(extract_module_id(Some("Módulo 1.2 Inducción")), Some(2));
    }

    #[test]
    fn test_unaccented_and_english_markers() {
        assert_eq!(extract_module_id(Some("modulo 1.12")), Some(12));
        assert_eq!(extract_module_id(Some("MODULO 1.3: Cultura")), Some(3));
        assert_eq!(extract_module_id(Some("Module 1.4 - Safety")), Some(4));
        assert_eq!(extract_module_id(Some("Mo\u{301}dulo 1.5")), Some(5));
    }

    #[test]
    fn test_marker_may_appear_anywhere() {
        assert_eq!(
            extract_module_id(Some("Programa HP - MÓDULO 1.9 Liderazgo")),
            Some(9)
        );
    }

    #[test]
    fn test_non_matching_titles() {
        assert_eq!(extract_module_id(Some("Generic Training")), None);
        assert_eq!(extract_module_id(Some("MÓDULO 2.1 - Avanzado")), None);
        assert_eq!(extract_module_id(Some("MÓDULO1.1")), None);
        assert_eq!(extract_module_id(Some("")), None);
        assert_eq!(extract_module_id(None), None);
    }

    #[test]
    fn test_zero_and_overflowing_ids_are_rejected() {
        assert_eq!(extract_module_id(Some("MÓDULO 1.0")), None);
        assert_eq!(extract_module_id(Some("MÓDULO 1.99999999999")), None);
    }

    #[test]
    fn test_extractor_trait() {
        let extractor = TitlePatternExtractor;
        assert_eq!(extractor.extract("MÓDULO 1.7 - Seguridad"), Some(7));
        assert_eq!(extractor.extract("Generic Training"), None);
    }
}
