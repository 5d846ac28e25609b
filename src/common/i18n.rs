// src/common/i18n.rs

use std::collections::HashMap;
use std::sync::OnceLock;

pub const DEFAULT_LANG: &str = "en";
pub const SUPPORTED_LANGS: [&str; 3] = ["en", "es", "pt"];

// Catálogos embutidos no binário
const CATALOGS: [(&str, &str); 3] = [
    ("en", include_str!("../../locales/en.json")),
    ("es", include_str!("../../locales/es.json")),
    ("pt", include_str!("../../locales/pt.json")),
];

/// Mensagens traduzidas por idioma. Chaves no formato `error.xxx`.
#[derive(Debug, Default)]
pub struct I18nStore {
    catalogs: HashMap<String, HashMap<String, String>>,
}

impl I18nStore {
    pub fn load() -> anyhow::Result<Self> {
        let mut catalogs = HashMap::new();
        for (lang, raw) in CATALOGS {
            let messages: HashMap<String, String> = serde_json::from_str(raw)
                .map_err(|e| anyhow::anyhow!("Catálogo '{}' inválido: {}", lang, e))?;
            catalogs.insert(lang.to_string(), messages);
        }
        Ok(Self { catalogs })
    }

    /// Instância compartilhada, usada onde não há AppState à mão.
    pub fn global() -> &'static I18nStore {
        static STORE: OnceLock<I18nStore> = OnceLock::new();
        STORE.get_or_init(|| {
            I18nStore::load().unwrap_or_else(|e| {
                tracing::error!("Falha ao carregar traduções: {}", e);
                I18nStore::default()
            })
        })
    }

    pub fn is_supported(lang: &str) -> bool {
        SUPPORTED_LANGS.contains(&lang)
    }

    /// Traduz `key` no idioma pedido, com fallback para o inglês e, por fim, para a própria chave.
    /// Parâmetros `{nome}` são substituídos pelos valores recebidos.
    pub fn translate(&self, lang: &str, key: &str, params: &[(&str, String)]) -> String {
        let template = self
            .catalogs
            .get(lang)
            .and_then(|c| c.get(key))
            .or_else(|| self.catalogs.get(DEFAULT_LANG).and_then(|c| c.get(key)))
            .cloned()
            .unwrap_or_else(|| key.to_string());

        params.iter().fold(template, |acc, (name, value)| {
            acc.replace(&format!("{{{}}}", name), value)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalogs_share_the_same_keys() {
        let store = I18nStore::load().unwrap();
        let en = &store.catalogs["en"];
        for lang in ["es", "pt"] {
            let other = &store.catalogs[lang];
            for key in en.keys() {
                assert!(other.contains_key(key), "{lang} sem a chave {key}");
            }
        }
    }

    #[test]
    fn substitutes_params_and_falls_back() {
        let store = I18nStore::load().unwrap();
        let msg = store.translate("en", "error.restaurant_limit", &[("max", "3".into())]);
        assert!(msg.contains('3'));

        let fallback = store.translate("fr", "error.invalid_token", &[]);
        assert_eq!(fallback, store.translate("en", "error.invalid_token", &[]));

        assert_eq!(store.translate("en", "error.unknown_key", &[]), "error.unknown_key");
    }
}
