//! Model alias catalog.
//!
//! Callers address models by friendly alias. Each alias maps to a
//! concrete provider model id and a mentor persona. Identifiers that
//! already look like raw provider ids (they contain `/`) pass through
//! untouched; anything else unknown falls back to the default, with the
//! fallback logged and counted.

use crate::services::metrics::MODEL_FALLBACKS_TOTAL;

pub const DEFAULT_ALIAS: &str = "chatgpt";

const MENTOR_PERSONA: &str = "You are an experienced career mentor for students and early-career \
     professionals. Give practical, specific, encouraging guidance. Keep answers concise and \
     actionable.";

/// A resolved catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelEntry {
    pub alias: &'static str,
    pub model_id: &'static str,
    pub system_prompt: &'static str,
}

const CATALOG: &[ModelEntry] = &[
    ModelEntry {
        alias: "chatgpt",
        model_id: "openai/gpt-4o-mini",
        system_prompt: MENTOR_PERSONA,
    },
    ModelEntry {
        alias: "gemini",
        model_id: "google/gemini-2.0-flash-001",
        system_prompt: MENTOR_PERSONA,
    },
    ModelEntry {
        alias: "claude",
        model_id: "anthropic/claude-3.5-sonnet",
        system_prompt: MENTOR_PERSONA,
    },
];

/// A resolved model: concrete id plus the persona to install when the
/// caller does not supply its own system turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedModel {
    pub model_id: String,
    pub system_prompt: &'static str,
}

/// Resolve an alias (or raw model id) to a concrete model.
///
/// Lenient on purpose: an unknown alias is a warning, never a request
/// failure.
pub fn resolve(requested: Option<&str>) -> ResolvedModel {
    let requested = match requested {
        Some(value) if !value.trim().is_empty() => value.trim(),
        _ => DEFAULT_ALIAS,
    };

    // Raw provider ids are addressed as "vendor/model"; trust them.
    if requested.contains('/') {
        return ResolvedModel {
            model_id: requested.to_string(),
            system_prompt: MENTOR_PERSONA,
        };
    }

    if let Some(entry) = CATALOG
        .iter()
        .find(|entry| entry.alias.eq_ignore_ascii_case(requested))
    {
        return ResolvedModel {
            model_id: entry.model_id.to_string(),
            system_prompt: entry.system_prompt,
        };
    }

    tracing::warn!(requested = %requested, fallback = DEFAULT_ALIAS, "Unknown model alias");
    if let Some(counter) = MODEL_FALLBACKS_TOTAL.get() {
        counter.with_label_values(&["unknown_alias"]).inc();
    }

    let default = CATALOG
        .iter()
        .find(|entry| entry.alias == DEFAULT_ALIAS)
        .unwrap_or(&CATALOG[0]);

    ResolvedModel {
        model_id: default.model_id.to_string(),
        system_prompt: default.system_prompt,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_aliases_resolve() {
        assert_eq!(resolve(Some("chatgpt")).model_id, "openai/gpt-4o-mini");
        assert_eq!(
            resolve(Some("gemini")).model_id,
            "google/gemini-2.0-flash-001"
        );
        assert_eq!(
            resolve(Some("claude")).model_id,
            "anthropic/claude-3.5-sonnet"
        );
    }

    #[test]
    fn alias_lookup_is_case_insensitive() {
        assert_eq!(resolve(Some("ChatGPT")).model_id, "openai/gpt-4o-mini");
    }

    #[test]
    fn unknown_alias_falls_back_to_default() {
        let resolved = resolve(Some("gpt-7-ultra"));
        assert_eq!(resolved.model_id, resolve(Some(DEFAULT_ALIAS)).model_id);
    }

    #[test]
    fn missing_alias_uses_default() {
        assert_eq!(resolve(None).model_id, resolve(Some(DEFAULT_ALIAS)).model_id);
        assert_eq!(
            resolve(Some("  ")).model_id,
            resolve(Some(DEFAULT_ALIAS)).model_id
        );
    }

    #[test]
    fn raw_provider_ids_pass_through() {
        assert_eq!(
            resolve(Some("mistralai/mistral-large")).model_id,
            "mistralai/mistral-large"
        );
    }
}
