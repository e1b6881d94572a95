use anyhow::{Result, anyhow};

pub const URL_VAR: &str = "SUPABASE_URL";
pub const KEY_VAR: &str = "SUPABASE_SERVICE_ROLE_KEY";

/// Connection settings for the hosted expenses table.
#[derive(Clone)]
pub struct Config {
    pub supabase_url: String,
    pub service_role_key: String,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("supabase_url", &self.supabase_url)
            .field("service_role_key", &"<redacted>")
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the config from an arbitrary variable lookup. Missing and empty
    /// values are both rejected.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup(URL_VAR).filter(|v| !v.trim().is_empty());
        let key = lookup(KEY_VAR).filter(|v| !v.trim().is_empty());

        match (url, key) {
            (Some(supabase_url), Some(service_role_key)) => Ok(Self {
                supabase_url,
                service_role_key,
            }),
            _ => Err(anyhow!(
                "Missing {} or {} in env variables",
                URL_VAR,
                KEY_VAR
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_config_reads_both_variables() {
        let config = Config::from_lookup(lookup_from(&[
            (URL_VAR, "https://abc.supabase.co"),
            (KEY_VAR, "service-key"),
        ]))
        .unwrap();

        assert_eq!(config.supabase_url, "https://abc.supabase.co");
        assert_eq!(config.service_role_key, "service-key");
    }

    #[test]
    fn test_config_fails_without_key() {
        let err = Config::from_lookup(lookup_from(&[(URL_VAR, "https://abc.supabase.co")]))
            .unwrap_err();
        assert!(err.to_string().contains(KEY_VAR));
    }

    #[test]
    fn test_config_fails_without_url() {
        let result = Config::from_lookup(lookup_from(&[(KEY_VAR, "service-key")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_config_rejects_empty_values() {
        let result = Config::from_lookup(lookup_from(&[(URL_VAR, ""), (KEY_VAR, "service-key")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_config_debug_hides_key() {
        let config = Config::from_lookup(lookup_from(&[
            (URL_VAR, "https://abc.supabase.co"),
            (KEY_VAR, "very-secret"),
        ]))
        .unwrap();
        assert!(!format!("{:?}", config).contains("very-secret"));
    }
}
