//! # Remote Geo Service Wire Types
//!
//! Data model for the four lookups exposed by the remote geo service:
//! countries, states-by-country, districts-by-state, and dial-code info.
//! All records are immutable once fetched — the client clones them freely
//! between cache, controller state, and callers.
//!
//! Field names on the wire are camelCase; every response body is wrapped
//! in an [`ApiEnvelope`] carrying a success flag, a human-readable
//! message, and a status code alongside the payload.

use crate::ids::{CountryCode, DistrictId, StateId};
use serde::{Deserialize, Serialize};

/// A country as listed by `GET /countries`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Country {
    /// The service's unique country key.
    pub code: CountryCode,
    /// Display name (e.g. "India").
    pub name: String,
    /// International dialing prefix (e.g. 91 for +91).
    pub dial_code: u32,
    /// Optional short name (e.g. "IN").
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,
}

/// A state as listed by `GET /states?countryCode=<code>`.
///
/// Only valid in combination with its owning country.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct State {
    /// The owning country.
    pub country_code: CountryCode,
    /// Unique within the owning country.
    pub state_id: StateId,
    /// Display name (e.g. "Karnataka").
    pub state_name: String,
}

/// A district as listed by `GET /districts?stateId=<id>`.
///
/// Only valid in combination with its owning state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct District {
    /// The owning country.
    pub country_code: CountryCode,
    /// The owning state.
    pub state_id: StateId,
    /// Unique within the owning state.
    pub district_id: DistrictId,
    /// Display name (e.g. "Bengaluru Urban").
    pub district_name: String,
}

/// Dial-code record as returned by `GET /stdcode?countryCode=<code>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DialCodeInfo {
    /// The country this dial code belongs to.
    pub country_code: CountryCode,
    /// Display name of the country.
    pub country_name: String,
    /// International dialing prefix (e.g. 91 for +91).
    pub dial_code: u32,
    /// Short name (e.g. "IN").
    pub short_name: String,
    /// URI of the country's flag image.
    pub logo_uri: String,
}

/// Response envelope wrapping every geo service payload.
///
/// A `success == false` envelope is an application-level failure even
/// when the HTTP status is 2xx; `data` may be absent in that case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEnvelope<T> {
    /// Whether the service considers the request successful.
    pub success: bool,
    /// Human-readable outcome message.
    pub message: String,
    /// Service-level status code (mirrors the HTTP status in practice).
    pub status_code: u16,
    /// The payload; absent on failure envelopes.
    #[serde(default = "Option::default")]
    pub data: Option<T>,
}
