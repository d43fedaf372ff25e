use anyhow::Context;
use std::path::PathBuf;

pub const DEFAULT_WORKSPACE: &str = "./workspace";
pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub workspace: PathBuf,
    pub host: String,
    pub port: u16,
}

impl Config {
    /// Reads `RECORDBOOK_*` variables from the process environment.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let workspace = non_empty("RECORDBOOK_WORKSPACE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_WORKSPACE));
        let host = non_empty("RECORDBOOK_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = match non_empty("RECORDBOOK_PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .with_context(|| format!("invalid RECORDBOOK_PORT: {}", raw))?,
            None => DEFAULT_PORT,
        };

        Ok(Config {
            workspace,
            host,
            port,
        })
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
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset_or_blank() {
        let cfg = Config::from_lookup(lookup_from(&[("RECORDBOOK_HOST", "  ")])).expect("config");
        assert_eq!(cfg.workspace, PathBuf::from(DEFAULT_WORKSPACE));
        assert_eq!(cfg.host, DEFAULT_HOST);
        assert_eq!(cfg.port, DEFAULT_PORT);
    }

    #[test]
    fn explicit_values_override_defaults() {
        let cfg = Config::from_lookup(lookup_from(&[
            ("RECORDBOOK_WORKSPACE", "/srv/recordbook"),
            ("RECORDBOOK_HOST", "0.0.0.0"),
            ("RECORDBOOK_PORT", "9090"),
        ]))
        .expect("config");
        assert_eq!(cfg.workspace, PathBuf::from("/srv/recordbook"));
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 9090);
    }

    #[test]
    fn bad_port_is_an_error() {
        let err = Config::from_lookup(lookup_from(&[("RECORDBOOK_PORT", "eighty")]))
            .expect_err("should fail");
        assert!(err.to_string().contains("RECORDBOOK_PORT"));
    }
}
