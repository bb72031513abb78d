pub mod phpipam;

use crate::config::Profile;
use crate::error::Result;

pub use phpipam::{Lookup, PhpIpam};

/// Resolves a hostname to the addresses an IPAM server knows for it.
pub trait Resolver {
    /// Connects and authenticates. Fails before any lookup can run.
    fn new(profile: &Profile) -> Result<Self>
    where
        Self: Sized;
    fn get(&self, key: &str) -> Result<String>;
}

/// One lookup with a freshly authenticated resolver of type `R`.
pub fn lookup<R: Resolver>(profile: &Profile, key: &str) -> Result<String> {
    R::new(profile)?.get(key)
}

/// Addresses of `key` as `ip:netmask:description:subnetId` lines.
///
/// Every call authenticates again; no token outlives the call.
pub fn get(profile: &Profile, key: &str) -> Result<String> {
    lookup::<PhpIpam>(profile, key)
}
