use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;
use serde_yaml::{Mapping, Value};

use crate::error::{Error, Result};

pub const DEFAULT_CA_BUNDLE: &str = "/etc/ssl/certs/ca-certificates.crt";
pub const DEFAULT_APP_ID: &str = "lookup";
pub const DEFAULT_PROFILE: &str = "phpipam";

/// A phpIPAM connection profile.
///
/// ```yaml
/// phpipam:
///   driver: phpipam
///   url: https://ipam.mydomain.com
///   auth:
///     user: 'read_api_user'
///     password: 'xxxxx'
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Profile {
    pub driver: Option<String>,
    pub url: Option<String>,
    pub auth: Option<Auth>,
    #[serde(default)]
    pub verify: Verify,
    pub app_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Auth {
    pub user: Option<String>,
    pub password: Option<String>,
}

/// Either a CA bundle path or an on/off switch for certificate checks.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Verify {
    Enabled(bool),
    Bundle(PathBuf),
}

impl Default for Verify {
    fn default() -> Self {
        Verify::Enabled(true)
    }
}

impl Verify {
    /// Bundle to trust, `None` when verification is switched off.
    pub fn ca_bundle(&self) -> Option<&Path> {
        match self {
            Verify::Enabled(true) => Some(Path::new(DEFAULT_CA_BUNDLE)),
            Verify::Enabled(false) => None,
            Verify::Bundle(path) => Some(path.as_path()),
        }
    }

    pub fn is_default(&self) -> bool {
        self.ca_bundle() == Some(Path::new(DEFAULT_CA_BUNDLE))
    }
}

/// The required parts of a profile once they are known to be present.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Credentials<'a> {
    pub url: &'a str,
    pub user: &'a str,
    pub password: &'a str,
}

impl Profile {
    pub fn new(url: &str, user: &str, password: &str) -> Self {
        Profile {
            driver: Some(DEFAULT_PROFILE.to_string()),
            url: Some(url.to_string()),
            auth: Some(Auth {
                user: Some(user.to_string()),
                password: Some(password.to_string()),
            }),
            verify: Verify::default(),
            app_id: None,
        }
    }

    pub fn with_verify(mut self, verify: Verify) -> Self {
        self.verify = verify;
        self
    }

    pub fn with_app_id(mut self, app_id: &str) -> Self {
        self.app_id = Some(app_id.to_string());
        self
    }

    pub fn app_id(&self) -> &str {
        self.app_id.as_deref().unwrap_or(DEFAULT_APP_ID)
    }

    pub fn validate(&self) -> Result<Credentials<'_>> {
        let url = required(self.url.as_deref(), "url")?;
        let auth = self
            .auth
            .as_ref()
            .ok_or_else(|| Error::Configuration("missing key: auth".to_string()))?;
        let user = required(auth.user.as_deref(), "auth.user")?;
        let password = required(auth.password.as_deref(), "auth.password")?;

        Ok(Credentials { url, user, password })
    }
}

fn required<'a>(value: Option<&'a str>, key: &str) -> Result<&'a str> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(Error::Configuration(format!("missing key: {}", key))),
    }
}

/// A master-style YAML document whose top-level keys name profiles.
#[derive(Debug, Default)]
pub struct ConfigStore {
    root: Mapping,
}

impl ConfigStore {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        log::debug!("reading configuration from {}", path.display());
        let raw = fs::read_to_string(path)?;
        raw.parse()
    }

    pub fn profile(&self, name: &str) -> Result<Profile> {
        match self.root.get(&Value::String(name.to_string())) {
            Some(value) => Ok(serde_yaml::from_value(value.clone())?),
            None => Err(Error::Configuration(format!("no profile named '{}'", name))),
        }
    }
}

impl FromStr for ConfigStore {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Ok(ConfigStore::default());
        }
        // `~` parses as null
        let root: Option<Mapping> = serde_yaml::from_str(raw)?;
        Ok(ConfigStore {
            root: root.unwrap_or_default(),
        })
    }
}
