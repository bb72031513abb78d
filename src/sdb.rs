//! `sdb://<profile>/<key>` lookup URIs.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

const SCHEME: &str = "sdb://";

#[derive(Debug, Clone, PartialEq)]
pub struct SdbUri {
    pub profile: String,
    pub key: String,
}

impl SdbUri {
    pub fn is_sdb(raw: &str) -> bool {
        raw.starts_with(SCHEME)
    }

    /// The key keeps any further `/`, only the first segment names the profile.
    pub fn parse(raw: &str) -> Result<Self> {
        let rest = raw
            .strip_prefix(SCHEME)
            .ok_or_else(|| Error::Configuration(format!("not an sdb:// uri: {}", raw)))?;

        match rest.split_once('/') {
            Some((profile, key)) if !profile.is_empty() && !key.is_empty() => Ok(SdbUri {
                profile: profile.to_string(),
                key: key.to_string(),
            }),
            _ => Err(Error::Configuration(format!(
                "expected sdb://<profile>/<key>, got {}",
                raw
            ))),
        }
    }
}

impl FromStr for SdbUri {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        SdbUri::parse(s)
    }
}

impl fmt::Display for SdbUri {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}/{}", SCHEME, self.profile, self.key)
    }
}
