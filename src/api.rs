//! Token-authenticated access to the phpIPAM REST API.
//!
//! An [`Api`] is only ever handed out after the `user` endpoint has issued a
//! token, so every query it performs is authenticated.

use std::fs;
use std::io;

use http::header::CONTENT_TYPE;
use http::Method;
use reqwest::blocking::{Client, Response};
use reqwest::Certificate;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::config::{Profile, Verify};
use crate::error::{Error, Result};

pub struct Api {
    base_url: String,
    client: Client,
    token: String,
}

#[derive(Debug, Deserialize)]
struct PhpIpamResponse<T> {
    data: Option<T>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenData {
    token: Option<String>,
}

impl Api {
    /// Validates the profile, builds the HTTP client and fetches a token.
    pub fn new(profile: &Profile) -> Result<Self> {
        let creds = profile.validate()?;

        let base_url = format!(
            "{}/api/{}",
            creds.url.trim_end_matches('/'),
            profile.app_id().trim_matches('/')
        );
        let client = build_client(creds.url, &profile.verify)?;
        let token = authenticate(&client, &base_url, creds.user, creds.password)?;

        Ok(Api {
            base_url,
            client,
            token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// GET `<base_url>/<resource>` and return its `data` payload.
    ///
    /// `None` when the payload is absent, `null`, or an empty list/object.
    pub fn query(&self, resource: &str) -> Result<Option<Value>> {
        let url = join(&self.base_url, resource);
        log::debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .header("token", self.token.as_str())
            .header(CONTENT_TYPE, "application/json")
            .send()
            .and_then(Response::error_for_status)
            .map_err(|source| Error::Request {
                url: url.clone(),
                source,
            })?;

        let body: PhpIpamResponse<Value> = decode(response, &url)?;
        match body.data {
            Some(data) if !is_empty(&data) => Ok(Some(data)),
            Some(_) => Ok(None),
            None => {
                if let Some(message) = body.message {
                    log::debug!("failed to get data from phpIPAM: {}: {}", url, message);
                }
                Ok(None)
            }
        }
    }
}

fn authenticate(client: &Client, base_url: &str, user: &str, password: &str) -> Result<String> {
    let url = join(base_url, "user");
    log::debug!("requesting a phpIPAM token from {} as {}", url, user);

    let response = client
        .request(Method::POST, &url)
        .basic_auth(user, Some(password))
        .send()
        .and_then(Response::error_for_status)
        .map_err(|source| Error::Authentication {
            url: url.clone(),
            source,
        })?;

    let body: PhpIpamResponse<TokenData> = decode(response, &url)?;
    body.data
        .and_then(|data| data.token)
        .ok_or_else(|| Error::Parse(format!("no data.token in response from {}", url)))
}

fn decode<T: DeserializeOwned>(response: Response, url: &str) -> Result<T> {
    response
        .json()
        .map_err(|e| Error::Parse(format!("{}: {}", url, e)))
}

fn join(base_url: &str, resource: &str) -> String {
    format!("{}/{}", base_url, resource.trim_start_matches('/'))
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
        _ => false,
    }
}

fn build_client(url: &str, verify: &Verify) -> Result<Client> {
    let mut builder = Client::builder();

    // plain http never touches the bundle
    if url.starts_with("https://") {
        match verify.ca_bundle() {
            None => {
                log::warn!("TLS certificate verification disabled for {}", url);
                builder = builder.danger_accept_invalid_certs(true);
            }
            Some(path) => match fs::read_to_string(path) {
                Ok(bundle) => {
                    let certs = Certificate::from_pem_bundle(bundle.as_bytes()).map_err(|e| {
                        Error::Configuration(format!("{}: {}", path.display(), e))
                    })?;
                    if certs.is_empty() {
                        return Err(Error::Configuration(format!(
                            "no certificates found in {}",
                            path.display()
                        )));
                    }
                    log::debug!("trusting {} certificates from {}", certs.len(), path.display());
                    for cert in certs {
                        builder = builder.add_root_certificate(cert);
                    }
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound && verify.is_default() => {
                    log::debug!(
                        "{} not found, using the built-in trust roots",
                        path.display()
                    );
                }
                Err(e) => {
                    return Err(Error::Configuration(format!(
                        "cannot read CA bundle {}: {}",
                        path.display(),
                        e
                    )))
                }
            },
        }
    }

    builder
        .build()
        .map_err(|e| Error::Configuration(format!("cannot build HTTP client: {}", e)))
}
