// src/middleware/i18n.rs

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};

use crate::common::i18n::{I18nStore, DEFAULT_LANG};

/// Idioma das mensagens de erro, lido do `Accept-Language`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale(pub String);

impl Default for Locale {
    fn default() -> Self {
        Locale(DEFAULT_LANG.to_string())
    }
}

impl Locale {
    /// Primeiro idioma suportado do cabeçalho ("pt-BR" -> "pt"), senão o padrão.
    pub fn from_header(value: &str) -> Self {
        accept_language::parse(value)
            .iter()
            .filter_map(|tag| tag.split('-').next())
            .map(str::to_lowercase)
            .find(|lang| I18nStore::is_supported(lang))
            .map(Locale)
            .unwrap_or_default()
    }

    pub fn from_parts(parts: &Parts) -> Self {
        parts
            .headers
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|value| value.to_str().ok())
            .map(Locale::from_header)
            .unwrap_or_default()
    }
}

impl<S> FromRequestParts<S> for Locale
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Locale::from_parts(parts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_the_first_supported_language() {
        assert_eq!(Locale::from_header("es-CO,es;q=0.9,en;q=0.8").0, "es");
        assert_eq!(Locale::from_header("fr-FR,pt-BR;q=0.5").0, "pt");
        assert_eq!(Locale::from_header("de").0, "en");
        assert_eq!(Locale::from_header("").0, "en");
    }
}
