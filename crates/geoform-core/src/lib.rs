//! # Geoform Core
//!
//! Foundational types shared across the Geoform stack: domain-primitive
//! newtypes for location identifiers, the wire data model of the remote
//! geo service, and phone number sanitization/formatting helpers.
//!
//! This crate is deliberately small and dependency-light. It carries no
//! I/O — the HTTP client, caching, and selection machinery live in
//! `geoform-client`.

pub mod ids;
pub mod phone;
pub mod types;

pub use ids::{CountryCode, DistrictId, IdError, StateId};
pub use types::{ApiEnvelope, Country, DialCodeInfo, District, State};
