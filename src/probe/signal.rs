//! Signal extraction rules.
//!
//! Each provider answers "does this account exist" differently. A [`Signal`]
//! names the rule used to read one provider's answer out of a response and
//! owns the typed schema that response is expected to have.

use crate::types::{Presence, ProbeFault};
use reqwest::StatusCode;
use serde::Deserialize;

/// Rendered not-found pages fall strictly above this size...
pub const PAGE_NOT_FOUND_LOW: usize = 186_500;
/// ...and strictly below this one.
pub const PAGE_NOT_FOUND_HIGH: usize = 187_700;
/// Pages strictly smaller than this are error or interstitial pages.
pub const PAGE_FLOOR: usize = 184_500;
/// Channel lookups with a payload strictly larger than this contain a channel.
pub const CHANNEL_PAYLOAD_CUTOFF: usize = 350;

/// Size bands for scraped profile pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageBands {
    pub not_found_low: usize,
    pub not_found_high: usize,
    pub floor: usize,
}

impl Default for PageBands {
    fn default() -> Self {
        Self {
            not_found_low: PAGE_NOT_FOUND_LOW,
            not_found_high: PAGE_NOT_FOUND_HIGH,
            floor: PAGE_FLOOR,
        }
    }
}

impl PageBands {
    /// Classify a page by its byte length. All boundaries are exclusive.
    pub fn classify(&self, len: usize) -> Presence {
        let in_not_found_band = len > self.not_found_low && len < self.not_found_high;
        if in_not_found_band || len < self.floor {
            Presence::Absent
        } else {
            Presence::Present
        }
    }
}

/// User object returned by a single-account lookup.
#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct UserObject {
    login: Option<String>,
    id: Option<u64>,
    url: Option<String>,
}

/// One account in a username search listing.
#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct ListedUser {
    username: Option<String>,
    id: Option<u64>,
    web_url: Option<String>,
}

/// Rule for reading presence out of a provider response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// JSON object whose `login` field is non-empty when the account exists.
    UserObject,
    /// JSON array of zero or more matching accounts.
    UserList,
    /// Bare JSON boolean answering "is this name available", the inverse of existence.
    AvailabilityFlag,
    /// Scraped page whose byte length falls into known not-found bands.
    PageSize(PageBands),
    /// API payload whose byte length exceeds a cutoff when a match exists.
    PayloadCutoff(usize),
}

impl Signal {
    /// Classify on status alone.
    ///
    /// `Ok(Some(_))` is a final answer and the body is never read.
    /// `Ok(None)` means the body decides.
    pub fn classify_status(&self, status: StatusCode) -> Result<Option<Presence>, ProbeFault> {
        match self {
            Signal::UserObject | Signal::UserList => {
                if status == StatusCode::NOT_FOUND {
                    Ok(Some(Presence::Absent))
                } else if !status.is_success() {
                    Err(ProbeFault::UnexpectedStatus(status.as_u16()))
                } else {
                    Ok(None)
                }
            }
            // Error responses still carry a body worth decoding.
            Signal::AvailabilityFlag => Ok(None),
            // Only the payload size is consumed.
            Signal::PageSize(_) | Signal::PayloadCutoff(_) => Ok(None),
        }
    }

    /// Classify a response body.
    pub fn classify_body(&self, body: &[u8]) -> Result<Presence, ProbeFault> {
        match self {
            Signal::UserObject => {
                let user: UserObject = decode(body)?;
                match user.login {
                    Some(login) if !login.is_empty() => Ok(Presence::Present),
                    Some(_) => Ok(Presence::Absent),
                    None => Err(ProbeFault::NoSignal("response has no login field".to_string())),
                }
            }
            Signal::UserList => {
                let users: Vec<ListedUser> = decode(body)?;
                Ok(presence_from(!users.is_empty()))
            }
            Signal::AvailabilityFlag => {
                let available: bool = decode(body)?;
                Ok(presence_from(!available))
            }
            Signal::PageSize(bands) => Ok(bands.classify(body.len())),
            Signal::PayloadCutoff(cutoff) => Ok(presence_from(body.len() > *cutoff)),
        }
    }

    /// Classify a complete response.
    pub fn classify(&self, status: StatusCode, body: &[u8]) -> Result<Presence, ProbeFault> {
        match self.classify_status(status)? {
            Some(presence) => Ok(presence),
            None => self.classify_body(body),
        }
    }
}

fn presence_from(exists: bool) -> Presence {
    if exists {
        Presence::Present
    } else {
        Presence::Absent
    }
}

fn decode<'a, T: Deserialize<'a>>(body: &'a [u8]) -> Result<T, ProbeFault> {
    serde_json::from_slice(body).map_err(|e| ProbeFault::Decode(e.to_string()))
}
