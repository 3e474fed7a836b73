//! Keyword categorisation of module titles

use serde::{Deserialize, Serialize};
use std::fmt;

/// Thematic category stored on a module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ModuleCategory {
    OrganizationalCulture,
    Operations,
    Safety,
    Technology,
    Management,
    Commercial,
    HealthAndWellness,
    Languages,
    #[default]
    General,
}

/// Keywords per category, searched in this order
const CATEGORY_KEYWORDS: &[(ModuleCategory, &[&str])] = &[
    (
        ModuleCategory::OrganizationalCulture,
        &["cultura", "valores", "ética", "compliance", "política"],
    ),
    (
        ModuleCategory::Operations,
        &["operación", "operaciones", "portuaria", "grúa", "equipo", "maquinaria"],
    ),
    (
        ModuleCategory::Safety,
        &["seguridad", "safety", "nom-035", "prevención", "riesgo", "emergencia"],
    ),
    (
        ModuleCategory::Technology,
        &["sistema", "software", "tecnología", "digital", "ti", "informática"],
    ),
    (
        ModuleCategory::Management,
        &["gestión", "liderazgo", "administración", "management", "proyecto"],
    ),
    (
        ModuleCategory::Commercial,
        &["comercial", "ventas", "cliente", "mercado", "negocio"],
    ),
    (
        ModuleCategory::HealthAndWellness,
        &["salud", "bienestar", "wellness", "médico", "primeros auxilios"],
    ),
    (
        ModuleCategory::Languages,
        &["inglés", "english", "idioma", "language"],
    ),
];

/// Keywords this short must match a whole word; longer ones may take a suffix
const SHORT_KEYWORD_LEN: usize = 3;

impl ModuleCategory {
    /// Display name stored in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleCategory::OrganizationalCulture => "Cultura Organizacional",
            ModuleCategory::Operations => "Operaciones",
            ModuleCategory::Safety => "Seguridad",
            ModuleCategory::Technology => "Tecnología",
            ModuleCategory::Management => "Gestión",
            ModuleCategory::Commercial => "Comercial",
            ModuleCategory::HealthAndWellness => "Salud y Bienestar",
            ModuleCategory::Languages => "Idiomas",
            ModuleCategory::General => "General",
        }
    }
}

impl fmt::Display for ModuleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Categorise a module by the first keyword found in its title.
///
/// A keyword must start at a word boundary, so "ti" does not fire inside
/// "Gestión"; plurals such as "sistemas" still match "sistema".
pub fn categorize_module(title: &str) -> ModuleCategory {
    let lowered = title.to_lowercase();
    CATEGORY_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|kw| contains_keyword(&lowered, kw)))
        .map(|(category, _)| *category)
        .unwrap_or_default()
}

fn contains_keyword(haystack: &str, keyword: &str) -> bool {
    let whole_word = keyword.chars().count() <= SHORT_KEYWORD_LEN;
    haystack.match_indices(keyword).any(|(start, matched)| {
        let starts_word = haystack[..start]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_alphanumeric());
        let ends_word = haystack[start + matched.len()..]
            .chars()
            .next()
            .is_none_or(|c| !c.is_alphanumeric());
        starts_word && (ends_word || !whole_word)
    })
}
