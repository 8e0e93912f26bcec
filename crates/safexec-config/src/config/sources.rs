use std::collections::BTreeMap;

use super::{Config, ConfigSource};

fn source_label(source: Option<&ConfigSource>) -> String {
    source.unwrap_or(&ConfigSource::Defaults).label().to_string()
}

impl Config {
    /// Get effective configuration as key-value pairs with source attribution
    ///
    /// Keys are sorted so the `safexec config` listing is stable.
    #[must_use]
    pub fn effective_config(&self) -> BTreeMap<String, (String, String)> {
        let mut config = BTreeMap::new();

        let mut add_config = |key: &str, value: Option<String>| {
            if let Some(val) = value {
                let source = source_label(self.source_attribution.get(key));
                config.insert(key.to_string(), (val, source));
            }
        };

        add_config("quiet", self.defaults.quiet.map(|v| v.to_string()));
        add_config("binary", self.defaults.binary.map(|v| v.to_string()));
        add_config("verbose", self.defaults.verbose.map(|v| v.to_string()));
        add_config(
            "cwd",
            self.spawn.cwd.as_ref().map(|p| p.display().to_string()),
        );
        add_config("env_clear", self.spawn.env_clear.map(|v| v.to_string()));

        if !self.spawn.env.is_empty() {
            let env = self
                .spawn
                .env
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join(", ");
            add_config("env", Some(env));
        }
        if !self.spawn.env_remove.is_empty() {
            add_config("env_remove", Some(self.spawn.env_remove.join(", ")));
        }

        config
    }
}
