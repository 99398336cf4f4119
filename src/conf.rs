//! Configuration read from the environment.

use std::time::Duration;

use crate::anyvar::http::DEFAULT_TIMEOUT;

/// Name of the variables holding the handover configuration.
pub const ENV_HANDOVER_TYPE_ID: &str = "HANDOVER_TYPE_ID";
pub const ENV_HANDOVER_TYPE_LABEL: &str = "HANDOVER_TYPE_LABEL";
pub const ENV_BEACON_HANDOVER_URL: &str = "BEACON_HANDOVER_URL";
pub const ENV_BEACON_NODE_ID: &str = "BEACON_NODE_ID";

/// Deployment environment of the service.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    strum::Display,
    strum::EnumString,
    serde::Serialize,
    serde::Deserialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum ServiceEnvironment {
    #[default]
    Local,
    Test,
    Dev,
    Staging,
    Prod,
}

/// Service settings, read from `ANYVLM_*` variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub env: ServiceEnvironment,
    pub service_uri: String,
    pub anyvar_uri: String,
    pub storage_path: String,
    pub anyvar_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            env: ServiceEnvironment::Local,
            service_uri: "http://localhost:8080".into(),
            anyvar_uri: "http://localhost:8000".into(),
            storage_path: "anyvlm-db".into(),
            anyvar_timeout: Duration::from_secs(DEFAULT_TIMEOUT),
        }
    }
}

impl Settings {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read settings through `lookup`; unset variables take the default.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let default = Self::default();
        let env = match lookup("ANYVLM_ENV") {
            Some(value) => value.parse().map_err(|e| {
                anyhow::anyhow!("invalid value {:?} for ANYVLM_ENV: {}", &value, e)
            })?,
            None => default.env,
        };
        let anyvar_timeout = match lookup("ANYVLM_ANYVAR_TIMEOUT") {
            Some(value) => Duration::from_secs(value.trim().parse().map_err(|e| {
                anyhow::anyhow!("invalid value {:?} for ANYVLM_ANYVAR_TIMEOUT: {}", &value, e)
            })?),
            None => default.anyvar_timeout,
        };
        Ok(Self {
            env,
            service_uri: lookup("ANYVLM_SERVICE_URI").unwrap_or(default.service_uri),
            anyvar_uri: lookup("ANYVLM_ANYVAR_URI").unwrap_or(default.anyvar_uri),
            storage_path: lookup("ANYVLM_STORAGE_PATH").unwrap_or(default.storage_path),
            anyvar_timeout,
        })
    }

    /// Let command line values take precedence over the environment.
    pub fn apply_overrides(&mut self, storage_path: Option<&str>, anyvar_uri: Option<&str>) {
        if let Some(storage_path) = storage_path {
            self.storage_path = storage_path.to_string();
        }
        if let Some(anyvar_uri) = anyvar_uri {
            self.anyvar_uri = anyvar_uri.to_string();
        }
    }
}

/// Handover metadata of this node, as required by the VLM protocol.
///
/// Values can only come from the environment; there is no way to override
/// them in code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandoverConf {
    handover_type_id: String,
    handover_type_label: String,
    handover_url: String,
    beacon_id: String,
}

impl HandoverConf {
    /// Read the handover configuration from the process environment.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the handover configuration through `lookup`; all values are required.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| {
            lookup(name)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| anyhow::anyhow!("environment variable {} must be set", name))
        };
        Ok(Self {
            handover_type_id: required(ENV_HANDOVER_TYPE_ID)?,
            handover_type_label: required(ENV_HANDOVER_TYPE_LABEL)?,
            handover_url: required(ENV_BEACON_HANDOVER_URL)?,
            beacon_id: required(ENV_BEACON_NODE_ID)?,
        })
    }

    /// Node id used as prefix of result set ids.
    pub fn handover_type_id(&self) -> &str {
        &self.handover_type_id
    }

    pub fn handover_type_label(&self) -> &str {
        &self.handover_type_label
    }

    pub fn handover_url(&self) -> &str {
        &self.handover_url
    }

    pub fn beacon_id(&self) -> &str {
        &self.beacon_id
    }
}


#[cfg(test)]
mod test {
    use std::{collections::HashMap, time::Duration};

    use pretty_assertions::assert_eq;

    use super::*;

    fn lookup(env: &HashMap<&str, &str>) -> impl Fn(&str) -> Option<String> {
        let env = env
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>();
        move |name| env.get(name).cloned()
    }

    #[test]
    fn settings_defaults() -> Result<(), anyhow::Error> {
        let env = HashMap::new();
        assert_eq!(Settings::from_lookup(lookup(&env))?, Settings::default());
        Ok(())
    }

    #[test]
    fn settings_from_env() -> Result<(), anyhow::Error> {
        let env: HashMap<&str, &str> = [
            ("ANYVLM_ENV", "PROD"),
            ("ANYVLM_ANYVAR_URI", "http://anyvar:8000"),
            ("ANYVLM_STORAGE_PATH", "/data/anyvlm"),
            ("ANYVLM_ANYVAR_TIMEOUT", "5"),
        ]
        .into_iter()
        .collect();
        let settings = Settings::from_lookup(lookup(&env))?;

        assert_eq!(settings.env, ServiceEnvironment::Prod);
        assert_eq!(settings.anyvar_uri, "http://anyvar:8000");
        assert_eq!(settings.storage_path, "/data/anyvlm");
        assert_eq!(settings.anyvar_timeout, Duration::from_secs(5));
        assert_eq!(settings.service_uri, "http://localhost:8080");

        Ok(())
    }

    #[test]
    fn settings_overrides() {
        let mut settings = Settings::default();
        settings.apply_overrides(Some("/tmp/db"), None);

        assert_eq!(settings.storage_path, "/tmp/db");
        assert_eq!(settings.anyvar_uri, "http://localhost:8000");
    }

    #[rstest::rstest]
    #[case("ANYVLM_ENV", "production")]
    #[case("ANYVLM_ANYVAR_TIMEOUT", "soon")]
    fn settings_invalid(#[case] name: &str, #[case] value: &str) {
        let env: HashMap<&str, &str> = [(name, value)].into_iter().collect();
        assert!(Settings::from_lookup(lookup(&env)).is_err());
    }

    #[test]
    fn handover_from_env() {
        let conf = test_conf::handover();

        assert_eq!(conf.handover_type_id(), "GREGoR-NCH");
        assert_eq!(conf.handover_type_label(), "GREGoR AnyVLM Reference");
        assert_eq!(conf.handover_url(), "https://variants.gregorconsortium.org/");
        assert_eq!(conf.beacon_id(), "org.anyvlm.gregor");
    }

    #[rstest::rstest]
    #[case("HANDOVER_TYPE_ID")]
    #[case("HANDOVER_TYPE_LABEL")]
    #[case("BEACON_HANDOVER_URL")]
    #[case("BEACON_NODE_ID")]
    fn handover_missing_variable(#[case] missing: &str) {
        let env: HashMap<&str, &str> = [
            ("HANDOVER_TYPE_ID", "node"),
            ("HANDOVER_TYPE_LABEL", "label"),
            ("BEACON_HANDOVER_URL", "https://example.org/"),
            ("BEACON_NODE_ID", "org.example"),
        ]
        .into_iter()
        .filter(|(name, _)| *name != missing)
        .collect();

        let res = HandoverConf::from_lookup(lookup(&env));
        assert!(res.is_err());
        assert!(format!("{}", res.unwrap_err()).contains(missing));
    }
}
