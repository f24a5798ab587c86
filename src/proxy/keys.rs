// Key resolver - selects the server-held secret for an API type

use std::fmt;

use super::ApiType;

pub const GEMINI_KEY_VAR: &str = "GEMINI_API_KEY";
pub const SEEDREAM_KEY_VAR: &str = "SEEDREAM_API_KEY";
pub const FREEPIK_KEY_VAR: &str = "FREEPIK_API_KEY";

/// Secrets captured once at startup. Read-only afterwards.
#[derive(Clone, Default)]
pub struct ApiKeys {
    gemini: Option<String>,
    seedream: Option<String>,
    freepik: Option<String>,
}

impl ApiKeys {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|value| !value.is_empty());
        Self {
            gemini: read(GEMINI_KEY_VAR),
            seedream: read(SEEDREAM_KEY_VAR),
            freepik: read(FREEPIK_KEY_VAR),
        }
    }

    pub fn get(&self, api_type: ApiType) -> Option<&str> {
        match api_type {
            ApiType::Gemini => self.gemini.as_deref(),
            // SEEDREAM_API_KEY is checked before FREEPIK_API_KEY
            ApiType::Seedream | ApiType::Freepik => {
                self.seedream.as_deref().or(self.freepik.as_deref())
            }
        }
    }

    /// Resolve a raw API type token. Unknown tokens have no key.
    pub fn resolve(&self, token: &str) -> Option<&str> {
        ApiType::parse(token).and_then(|api_type| self.get(api_type))
    }

    pub fn has_key(&self, token: &str) -> bool {
        self.resolve(token).is_some()
    }
}

impl fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mark = |value: &Option<String>| if value.is_some() { "<set>" } else { "<unset>" };
        f.debug_struct("ApiKeys")
            .field("gemini", &mark(&self.gemini))
            .field("seedream", &mark(&self.seedream))
            .field("freepik", &mark(&self.freepik))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn keys(vars: &[(&str, &str)]) -> ApiKeys {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ApiKeys::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn test_gemini_key() {
        let keys = keys(&[(GEMINI_KEY_VAR, "g-secret")]);
        assert_eq!(keys.resolve("gemini"), Some("g-secret"));
        assert_eq!(keys.resolve("freepik"), None);
    }

    #[test]
    fn test_seedream_wins_over_freepik() {
        let keys = keys(&[(SEEDREAM_KEY_VAR, "sd"), (FREEPIK_KEY_VAR, "fp")]);
        assert_eq!(keys.resolve("seedream"), Some("sd"));
        assert_eq!(keys.resolve("freepik"), Some("sd"));
    }

    #[test]
    fn test_freepik_fallback() {
        let keys = keys(&[(FREEPIK_KEY_VAR, "fp")]);
        assert_eq!(keys.resolve("seedream"), Some("fp"));
        assert_eq!(keys.resolve("freepik"), Some("fp"));
    }

    #[test]
    fn test_empty_value_is_unset() {
        let keys = keys(&[(SEEDREAM_KEY_VAR, ""), (FREEPIK_KEY_VAR, "fp"), (GEMINI_KEY_VAR, "")]);
        assert_eq!(keys.resolve("seedream"), Some("fp"));
        assert!(!keys.has_key("gemini"));
    }

    #[test]
    fn test_unknown_and_case_sensitive_tokens() {
        let keys = keys(&[(GEMINI_KEY_VAR, "g")]);
        assert_eq!(keys.resolve("Gemini"), None);
        assert_eq!(keys.resolve("openai"), None);
    }

    #[test]
    fn test_debug_hides_secrets() {
        let keys = keys(&[(GEMINI_KEY_VAR, "super-secret")]);
        let printed = format!("{:?}", keys);
        assert!(!printed.contains("super-secret"));
        assert!(printed.contains("<set>"));
    }
}
