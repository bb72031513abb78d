//! Hostname to address lookups against a {php}IPAM server.
//!
//! ```no_run
//! use phpipam_sdb::{resolver, Profile};
//!
//! let profile = Profile::new("https://ipam.mydomain.com", "read_api_user", "xxxxx");
//! // 10.100.15.20:255.255.255.0:PV Backwww:27
//! println!("{}", resolver::get(&profile, "www01")?);
//! # Ok::<(), phpipam_sdb::Error>(())
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod logger;
pub mod resolver;
pub mod sdb;

pub use config::{ConfigStore, Profile, Verify};
pub use error::{Error, Result};
pub use resolver::Resolver;
pub use sdb::SdbUri;
