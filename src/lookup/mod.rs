//! Single-shot lookups that sit beside the provider probes.
//!
//! - IP geolocation through a public JSON API
//! - Full-name search in a local people database

pub mod ip;
pub mod people;

pub use ip::{IpInfo, IpLocator};
pub use people::{Person, PersonDatabase};
