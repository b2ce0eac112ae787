//! # Geo Data Gateway
//!
//! Typed HTTP client for the remote geo service's four lookups —
//! countries, states-by-country, districts-by-state, and dial-code info
//! — with a consult-the-cache-first policy and latency instrumentation.
//!
//! ## Architecture
//!
//! [`GeoClient`] wraps a `reqwest::Client` carrying the service's
//! `x-api-key` / `x-app-version` headers and per-request timeout. The
//! [`TimedCache`] and [`MetricsRecorder`] are constructed once at
//! process start and passed in as shared handles, so the gateway and
//! the selection controller observe one cache and one metrics stream
//! without hidden globals.
//!
//! ## Cache Policy
//!
//! Each lookup derives a deterministic key from the operation and its
//! parameters. A hit returns the cached clone with no network access and
//! no network-call metric sample. A miss runs the fetch inside
//! [`MetricsRecorder::measure_call`] and stores the result on success
//! only — failures are propagated unchanged and never cached. Country
//! and state-level data lives for [`GEO_DATA_TTL`]; dial codes change
//! far less often and live for [`DIAL_CODE_TTL`].

use crate::cache::TimedCache;
use crate::config::{ConfigError, GeoServiceConfig};
use crate::error::GeoApiError;
use crate::metrics::MetricsRecorder;
use geoform_core::{ApiEnvelope, Country, CountryCode, DialCodeInfo, District, State, StateId};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;

/// Lifetime of cached country, state, and district lists.
pub const GEO_DATA_TTL: Duration = Duration::from_secs(10 * 60);

/// Lifetime of cached dial-code records.
pub const DIAL_CODE_TTL: Duration = Duration::from_secs(30 * 60);

const COUNTRIES_KEY: &str = "countries";

fn states_key(country: CountryCode) -> String {
    format!("states_{country}")
}

fn districts_key(state: StateId) -> String {
    format!("districts_{state}")
}

fn dial_code_key(country: CountryCode) -> String {
    format!("dial_code_{country}")
}

/// Cached geo payloads, one variant per lookup.
///
/// A single enum keeps all four lookups in one shared map (so
/// [`GeoClient::clear_cache`] and the cache statistics cover
/// everything) while staying strongly typed. The fixed key scheme means
/// a key never maps to the wrong variant; if it somehow did, the lookup
/// treats it as a miss rather than panicking.
#[derive(Debug, Clone)]
pub enum CachedGeo {
    /// Payload of `GET /countries`.
    Countries(Vec<Country>),
    /// Payload of `GET /states`.
    States(Vec<State>),
    /// Payload of `GET /districts`.
    Districts(Vec<District>),
    /// Payload of `GET /stdcode`.
    DialCode(DialCodeInfo),
}

/// HTTP gateway to the remote geo service.
#[derive(Debug)]
pub struct GeoClient {
    http: reqwest::Client,
    base_url: String,
    cache: Arc<TimedCache<CachedGeo>>,
    metrics: Arc<MetricsRecorder>,
}

impl GeoClient {
    /// Build a gateway from configuration plus the process-wide cache
    /// and metrics handles.
    pub fn new(
        config: GeoServiceConfig,
        cache: Arc<TimedCache<CachedGeo>>,
        metrics: Arc<MetricsRecorder>,
    ) -> Result<Self, GeoApiError> {
        let mut headers = reqwest::header::HeaderMap::new();
        if !config.api_key.is_empty() {
            headers.insert(
                "x-api-key",
                reqwest::header::HeaderValue::from_str(&config.api_key)
                    .map_err(|_| ConfigError::InvalidHeaderValue { name: "api key" })?,
            );
        }
        if !config.app_version.is_empty() {
            headers.insert(
                "x-app-version",
                reqwest::header::HeaderValue::from_str(&config.app_version)
                    .map_err(|_| ConfigError::InvalidHeaderValue { name: "app version" })?,
            );
        }
        headers.insert(
            reqwest::header::CONTENT_TYPE,
            reqwest::header::HeaderValue::from_static("application/json"),
        );

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| GeoApiError::Http {
                endpoint: config.base_url.clone(),
                source: e,
            })?;

        let base_url = config.base_url.trim_end_matches('/').to_string();
        Ok(Self {
            http,
            base_url,
            cache,
            metrics,
        })
    }

    /// Fetch the list of countries.
    pub async fn get_countries(&self) -> Result<Vec<Country>, GeoApiError> {
        if let Some(CachedGeo::Countries(countries)) = self.cache.get(COUNTRIES_KEY) {
            tracing::debug!(key = COUNTRIES_KEY, "serving countries from cache");
            return Ok(countries);
        }

        tracing::debug!("fetching countries from geo service");
        let countries: Vec<Country> = self
            .metrics
            .measure_call("get_countries", self.fetch_payload("/countries", &[]))
            .await?;

        self.cache.set_with_ttl(
            COUNTRIES_KEY,
            CachedGeo::Countries(countries.clone()),
            GEO_DATA_TTL,
        );
        Ok(countries)
    }

    /// Fetch the states of a country.
    pub async fn get_states(&self, country: CountryCode) -> Result<Vec<State>, GeoApiError> {
        let key = states_key(country);
        if let Some(CachedGeo::States(states)) = self.cache.get(&key) {
            tracing::debug!(key = %key, "serving states from cache");
            return Ok(states);
        }

        tracing::debug!(%country, "fetching states from geo service");
        let states: Vec<State> = self
            .metrics
            .measure_call(
                "get_states",
                self.fetch_payload("/states", &[("countryCode", country.value())]),
            )
            .await?;

        self.cache
            .set_with_ttl(key, CachedGeo::States(states.clone()), GEO_DATA_TTL);
        Ok(states)
    }

    /// Fetch the districts of a state.
    pub async fn get_districts(&self, state: StateId) -> Result<Vec<District>, GeoApiError> {
        let key = districts_key(state);
        if let Some(CachedGeo::Districts(districts)) = self.cache.get(&key) {
            tracing::debug!(key = %key, "serving districts from cache");
            return Ok(districts);
        }

        tracing::debug!(%state, "fetching districts from geo service");
        let districts: Vec<District> = self
            .metrics
            .measure_call(
                "get_districts",
                self.fetch_payload("/districts", &[("stateId", state.value())]),
            )
            .await?;

        self.cache
            .set_with_ttl(key, CachedGeo::Districts(districts.clone()), GEO_DATA_TTL);
        Ok(districts)
    }

    /// Fetch the dial-code record of a country.
    ///
    /// The service answers with a list; the first entry is taken and an
    /// empty list is surfaced as [`GeoApiError::EmptyPayload`].
    pub async fn get_dial_code(&self, country: CountryCode) -> Result<DialCodeInfo, GeoApiError> {
        let key = dial_code_key(country);
        if let Some(CachedGeo::DialCode(info)) = self.cache.get(&key) {
            tracing::debug!(key = %key, "serving dial code from cache");
            return Ok(info);
        }

        tracing::debug!(%country, "fetching dial code from geo service");
        let info = self
            .metrics
            .measure_call("get_dial_code", async {
                let records: Vec<DialCodeInfo> = self
                    .fetch_payload("/stdcode", &[("countryCode", country.value())])
                    .await?;
                records
                    .into_iter()
                    .next()
                    .ok_or_else(|| GeoApiError::EmptyPayload {
                        endpoint: "/stdcode".to_string(),
                    })
            })
            .await?;

        self.cache
            .set_with_ttl(key, CachedGeo::DialCode(info.clone()), DIAL_CODE_TTL);
        Ok(info)
    }

    /// Remove every cached entry.
    pub fn clear_cache(&self) {
        self.cache.clear();
        tracing::debug!("geo cache cleared");
    }

    /// Remove the state-list and dial-code entries for one country.
    ///
    /// District entries are keyed by state identifier, not country, and
    /// are deliberately left to expire via their own ttl.
    pub fn clear_country_cache(&self, country: CountryCode) {
        self.cache.remove(&states_key(country));
        self.cache.remove(&dial_code_key(country));
        tracing::debug!(%country, "geo cache cleared for country");
    }

    /// Number of cached entries (expired-but-unswept entries included).
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Keys of all cached entries.
    pub fn cache_keys(&self) -> Vec<String> {
        self.cache.keys()
    }

    /// Perform one `GET`, unwrap the envelope, and surface transport,
    /// status, envelope, and decode failures as [`GeoApiError`].
    async fn fetch_payload<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, u32)],
    ) -> Result<T, GeoApiError> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .http
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| GeoApiError::Http {
                endpoint: path.to_string(),
                source: e,
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GeoApiError::Status {
                endpoint: path.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let envelope: ApiEnvelope<T> =
            resp.json().await.map_err(|e| GeoApiError::Deserialization {
                endpoint: path.to_string(),
                source: e,
            })?;

        if !envelope.success {
            return Err(GeoApiError::Api {
                endpoint: path.to_string(),
                status_code: envelope.status_code,
                message: envelope.message,
            });
        }

        envelope.data.ok_or_else(|| GeoApiError::EmptyPayload {
            endpoint: path.to_string(),
        })
    }
}
