use super::Resolver;

use std::fmt;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::api::Api;
use crate::config::Profile;
use crate::error::{Error, Result};

const SEARCH_RESOURCE: &str = "addresses/search_hostname_partial";
const SUBNET_RESOURCE: &str = "subnets";

// everything but RFC 3986 unreserved characters
const SEGMENT_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

#[cfg(windows)]
pub const LINE_SEPARATOR: &str = "\r\n";
#[cfg(not(windows))]
pub const LINE_SEPARATOR: &str = "\n";

pub struct PhpIpam {
    api: Api,
}

/// An entry of the hostname search.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddressRecord {
    #[serde(default, deserialize_with = "text")]
    pub ip: Option<String>,
    #[serde(default)]
    pub hostname: Option<String>,
    #[serde(default, rename = "subnetId", deserialize_with = "text")]
    pub subnet_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SubnetRecord {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub calculation: Option<Calculation>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Calculation {
    #[serde(default, rename = "Subnet netmask")]
    pub netmask: Option<String>,
}

/// One resolved address, displayed as `ip:netmask:description:subnetId`.
#[derive(Debug, Clone, PartialEq)]
pub struct Lookup {
    pub ip: String,
    pub netmask: String,
    pub description: String,
    pub subnet_id: String,
}

impl fmt::Display for Lookup {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.ip, self.netmask, self.description, self.subnet_id
        )
    }
}

/// Escapes `value` so it stays a single path segment.
fn segment(value: &str) -> String {
    utf8_percent_encode(value, SEGMENT_ENCODE_SET).to_string()
}

// phpIPAM sends ids as strings or numbers depending on version
fn text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

impl AddressRecord {
    /// `(ip, subnetId)` when the record is an exact match for `key`.
    pub fn matching(&self, key: &str) -> Option<(&str, &str)> {
        match (&self.ip, &self.subnet_id, &self.hostname) {
            (Some(ip), Some(subnet_id), Some(hostname)) if hostname == key => {
                Some((ip.as_str(), subnet_id.as_str()))
            }
            _ => None,
        }
    }
}

impl SubnetRecord {
    pub fn netmask(&self) -> Option<&str> {
        self.calculation.as_ref()?.netmask.as_deref()
    }
}

impl PhpIpam {
    /// Search results for `key`, empty when the hostname is unknown.
    pub fn search(&self, key: &str) -> Result<Vec<AddressRecord>> {
        let resource = format!("{}/{}", SEARCH_RESOURCE, segment(key));
        match self.api.query(&resource)? {
            Some(data) => serde_json::from_value(data)
                .map_err(|e| Error::Parse(format!("{}: {}", resource, e))),
            None => Ok(Vec::new()),
        }
    }

    pub fn subnet(&self, subnet_id: &str) -> Result<Option<SubnetRecord>> {
        let resource = format!("{}/{}", SUBNET_RESOURCE, segment(subnet_id));
        match self.api.query(&resource)? {
            Some(data) => serde_json::from_value(data)
                .map(Some)
                .map_err(|e| Error::Parse(format!("{}: {}", resource, e))),
            None => Ok(None),
        }
    }

    /// Exact hostname matches for `key`, in search order, with their subnet.
    pub fn addresses(&self, key: &str) -> Result<Vec<Lookup>> {
        let records = self.search(key)?;
        if records.is_empty() {
            log::info!("{} not found in phpIPAM", key);
            return Ok(Vec::new());
        }

        let mut found = Vec::new();
        for record in &records {
            let (ip, subnet_id) = match record.matching(key) {
                Some(m) => m,
                None => {
                    log::debug!("skipping partial match {:?}", record.hostname);
                    continue;
                }
            };

            let subnet = match self.subnet(subnet_id)? {
                Some(s) => s,
                None => {
                    log::debug!("no data for subnet {} of {}, skipping", subnet_id, ip);
                    continue;
                }
            };

            found.push(Lookup {
                ip: ip.to_string(),
                netmask: subnet.netmask().unwrap_or_default().to_string(),
                description: subnet.description.unwrap_or_default(),
                subnet_id: subnet_id.to_string(),
            });
        }

        log::info!("{} address(es) found for {}", found.len(), key);
        Ok(found)
    }
}

impl Resolver for PhpIpam {
    fn new(profile: &Profile) -> Result<Self> {
        Ok(PhpIpam {
            api: Api::new(profile)?,
        })
    }

    fn get(&self, key: &str) -> Result<String> {
        let lines: Vec<String> = self
            .addresses(key)?
            .iter()
            .map(Lookup::to_string)
            .collect();

        Ok(lines.join(LINE_SEPARATOR))
    }
}
