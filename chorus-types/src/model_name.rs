//! Model-name checks used before a pull.

use crate::types::{ModelInfo, ModelNameCheck};

/// Part of a model name before the tag.
///
/// ```
/// assert_eq!(chorus_types::base_name("llama3.2:3b"), "llama3.2");
/// assert_eq!(chorus_types::base_name("mistral"), "mistral");
/// ```
#[must_use]
pub fn base_name(name: &str) -> &str {
    name.split_once(':').map_or(name, |(base, _)| base)
}

/// Whether `name` has the shape `base[:tag]`.
///
/// The base may contain a namespace (`library/llama3`); the tag may not
/// contain slashes.
#[must_use]
pub fn is_well_formed(name: &str) -> bool {
    let (base, tag) = match name.split_once(':') {
        Some((base, tag)) => (base, Some(tag)),
        None => (name, None),
    };
    let base_ok = !base.is_empty()
        && !base.starts_with(['/', '.', '-'])
        && base
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | '/'));
    let tag_ok = tag.is_none_or(|t| {
        !t.is_empty()
            && t
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
    });
    base_ok && tag_ok
}

/// Check `name` against the installed models.
///
/// Suggestions are installed names sharing the base name, in listing order.
#[must_use]
pub fn check_model_name(name: &str, installed: &[ModelInfo]) -> ModelNameCheck {
    let base = base_name(name).to_ascii_lowercase();
    let suggestions = if base.is_empty() {
        Vec::new()
    } else {
        installed
            .iter()
            .map(|m| m.name.as_str())
            .filter(|candidate| {
                let candidate_base = base_name(candidate).to_ascii_lowercase();
                *candidate != name
                    && (candidate_base.contains(&base) || base.contains(&candidate_base))
            })
            .map(str::to_string)
            .collect()
    };

    ModelNameCheck {
        valid: is_well_formed(name),
        suggestions,
    }
}
