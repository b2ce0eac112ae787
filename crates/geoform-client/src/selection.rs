//! # Cascading Selection Controller
//!
//! Orchestrates the dependent-selection state machine behind the
//! location form: country → state → district, plus the dial code that
//! follows the country independently of state and district.
//!
//! ## Staleness
//!
//! Invalidation is scoped to the dependency level. A country change (or
//! a form reset) bumps the country generation, which the states and
//! dial-code fetches check; a state change bumps only the state
//! generation, which the district fetch checks. Every fetch carries the
//! generation it was issued under and a fetch whose generation no
//! longer matches on completion is discarded wholesale — its data,
//! error, and loading flags never touch the state a newer selection
//! owns. Changing the state therefore never discards the country's own
//! in-flight fetches. The underlying network call is not aborted;
//! cancellation is cooperative.
//!
//! ## Field Independence
//!
//! Loading flags and error messages are per field. A failed state fetch
//! marks only the state field; the dial-code fetch for the same country
//! proceeds and lands normally.

use crate::client::GeoClient;
use crate::metrics::MetricsRecorder;
use geoform_core::phone::{format_phone_number, sanitize_digits};
use geoform_core::{Country, CountryCode, DialCodeInfo, District, DistrictId, State, StateId};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Per-field loading flags. One small struct rather than four parallel
/// booleans, so [`SelectionController::reset_form`] can zero them in one
/// assignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldFlags {
    /// The country list is being fetched.
    pub countries: bool,
    /// The state list is being fetched.
    pub states: bool,
    /// The district list is being fetched.
    pub districts: bool,
    /// The dial-code record is being fetched.
    pub dial_code: bool,
}

/// Per-field failure indicators. `None` means the field's last fetch
/// succeeded (or none was attempted).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    /// Failure loading the country list.
    pub countries: Option<String>,
    /// Failure loading the state list.
    pub states: Option<String>,
    /// Failure loading the district list.
    pub districts: Option<String>,
    /// Failure loading the dial-code record.
    pub dial_code: Option<String>,
}

impl FieldErrors {
    /// Whether any field currently carries a failure indicator.
    pub fn any(&self) -> bool {
        self.countries.is_some()
            || self.states.is_some()
            || self.districts.is_some()
            || self.dial_code.is_some()
    }
}

/// The full observable state of the cascading form, handed to callers
/// as a clone via [`SelectionController::snapshot`].
#[derive(Debug, Clone, Default)]
pub struct SelectionState {
    /// Last-fetched country list.
    pub countries: Vec<Country>,
    /// Last-fetched state list for the selected country.
    pub states: Vec<State>,
    /// Last-fetched district list for the selected state.
    pub districts: Vec<District>,
    /// Dial-code record for the selected country.
    pub dial_code: Option<DialCodeInfo>,
    /// Currently chosen country, if any.
    pub selected_country: Option<CountryCode>,
    /// Currently chosen state, if any.
    pub selected_state: Option<StateId>,
    /// Currently chosen district, if any.
    pub selected_district: Option<DistrictId>,
    /// Sanitized phone digits entered so far.
    pub phone_digits: String,
    /// Per-field loading flags.
    pub loading: FieldFlags,
    /// Per-field failure indicators.
    pub errors: FieldErrors,
}

/// The payload assembled for form submission once every field is chosen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSubmission {
    /// Display name of the selected country.
    pub country: String,
    /// Display name of the selected state.
    pub state: String,
    /// Display name of the selected district.
    pub district: String,
    /// `+<dialCode> <digits>` (bare digits if no dial code resolved).
    pub phone_number: String,
}

/// State machine driving the four dependent form fields.
///
/// All methods take `&self`; share the controller via `Arc` and call it
/// from any task. State mutation happens under a single mutex that is
/// never held across a suspension point.
pub struct SelectionController {
    client: GeoClient,
    metrics: Arc<MetricsRecorder>,
    state: Mutex<SelectionState>,
    // Bumped by country changes and resets; checked by the states and
    // dial-code fetch arms.
    country_generation: AtomicU64,
    // Bumped by country changes, state changes, and resets; checked by
    // the district fetch arm.
    state_generation: AtomicU64,
}

impl SelectionController {
    /// Create a controller over a gateway and the shared metrics handle.
    pub fn new(client: GeoClient, metrics: Arc<MetricsRecorder>) -> Self {
        Self {
            client,
            metrics,
            state: Mutex::new(SelectionState::default()),
            country_generation: AtomicU64::new(0),
            state_generation: AtomicU64::new(0),
        }
    }

    /// A clone of the current form state for UI binding.
    pub fn snapshot(&self) -> SelectionState {
        self.state.lock().clone()
    }

    /// Fetch the country list (typically once, at startup).
    pub async fn load_countries(&self) {
        let timer = self.metrics.start_timer("load_countries");
        let generation = {
            let mut state = self.state.lock();
            state.loading.countries = true;
            state.errors.countries = None;
            self.country_generation.load(Ordering::SeqCst)
        };

        let result = self.client.get_countries().await;

        let mut state = self.state.lock();
        if self.country_generation.load(Ordering::SeqCst) != generation {
            // The form was reset while the fetch was in flight.
            return;
        }
        state.loading.countries = false;
        match result {
            Ok(countries) => {
                state.countries = countries;
                timer.stop();
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to load countries");
                state.countries.clear();
                state.errors.countries = Some(e.to_string());
            }
        }
    }

    /// Change the selected country.
    ///
    /// `Some(code)` clears every downstream selection and list, then
    /// fetches the country's states and dial code concurrently; each
    /// fetch lands independently and only while this selection is still
    /// current. `None` clears downstream state without any fetch. A code
    /// not present in the last-fetched country list is ignored.
    pub async fn select_country(&self, code: Option<CountryCode>) {
        let Some(code) = code else {
            let mut state = self.state.lock();
            self.country_generation.fetch_add(1, Ordering::SeqCst);
            self.state_generation.fetch_add(1, Ordering::SeqCst);
            state.selected_country = None;
            Self::clear_downstream_of_country(&mut state);
            return;
        };

        let generation = {
            let mut state = self.state.lock();
            if !state.countries.iter().any(|c| c.code == code) {
                tracing::warn!(%code, "ignoring selection of unknown country");
                return;
            }
            state.selected_country = Some(code);
            Self::clear_downstream_of_country(&mut state);
            state.loading.states = true;
            state.loading.dial_code = true;
            // A country change also invalidates any in-flight district
            // fetch for the previous state.
            self.state_generation.fetch_add(1, Ordering::SeqCst);
            self.country_generation.fetch_add(1, Ordering::SeqCst) + 1
        };

        let states_fut = async {
            let timer = self.metrics.start_timer("load_states");
            let result = self.client.get_states(code).await;
            let mut state = self.state.lock();
            if self.country_generation.load(Ordering::SeqCst) != generation {
                return;
            }
            state.loading.states = false;
            match result {
                Ok(states) => {
                    state.states = states;
                    timer.stop();
                }
                Err(e) => {
                    tracing::warn!(%code, error = %e, "failed to load states");
                    state.states.clear();
                    state.errors.states = Some(e.to_string());
                }
            }
        };

        let dial_fut = async {
            let timer = self.metrics.start_timer("load_dial_code");
            let result = self.client.get_dial_code(code).await;
            let mut state = self.state.lock();
            if self.country_generation.load(Ordering::SeqCst) != generation {
                return;
            }
            state.loading.dial_code = false;
            match result {
                Ok(info) => {
                    state.dial_code = Some(info);
                    timer.stop();
                }
                Err(e) => {
                    tracing::warn!(%code, error = %e, "failed to load dial code");
                    state.dial_code = None;
                    state.errors.dial_code = Some(e.to_string());
                }
            }
        };

        tokio::join!(states_fut, dial_fut);
    }

    /// Change the selected state.
    ///
    /// `Some(id)` clears the district selection and list and fetches the
    /// state's districts; `None` clears them without fetching. An id not
    /// present in the last-fetched state list is ignored.
    pub async fn select_state(&self, id: Option<StateId>) {
        let Some(id) = id else {
            let mut state = self.state.lock();
            self.state_generation.fetch_add(1, Ordering::SeqCst);
            state.selected_state = None;
            Self::clear_downstream_of_state(&mut state);
            return;
        };

        let generation = {
            let mut state = self.state.lock();
            if !state.states.iter().any(|s| s.state_id == id) {
                tracing::warn!(state_id = %id, "ignoring selection of unknown state");
                return;
            }
            state.selected_state = Some(id);
            Self::clear_downstream_of_state(&mut state);
            state.loading.districts = true;
            self.state_generation.fetch_add(1, Ordering::SeqCst) + 1
        };

        let timer = self.metrics.start_timer("load_districts");
        let result = self.client.get_districts(id).await;

        let mut state = self.state.lock();
        if self.state_generation.load(Ordering::SeqCst) != generation {
            return;
        }
        state.loading.districts = false;
        match result {
            Ok(districts) => {
                state.districts = districts;
                timer.stop();
            }
            Err(e) => {
                tracing::warn!(state_id = %id, error = %e, "failed to load districts");
                state.districts.clear();
                state.errors.districts = Some(e.to_string());
            }
        }
    }

    /// Change the selected district. Terminal — nothing depends on the
    /// district, so no fetch is triggered. An id not present in the
    /// last-fetched district list is ignored.
    pub fn select_district(&self, id: Option<DistrictId>) {
        let mut state = self.state.lock();
        match id {
            Some(id) if !state.districts.iter().any(|d| d.district_id == id) => {
                tracing::warn!(district_id = %id, "ignoring selection of unknown district");
            }
            other => state.selected_district = other,
        }
    }

    /// Replace the phone digits with a sanitized copy of `input`.
    pub fn set_phone_digits(&self, input: &str) {
        self.state.lock().phone_digits = sanitize_digits(input);
    }

    /// The phone number as it would be submitted:
    /// `+<dialCode> <digits>`, or bare digits until a dial code resolves.
    pub fn formatted_phone_number(&self) -> String {
        let state = self.state.lock();
        format_phone_number(
            state.dial_code.as_ref().map(|d| d.dial_code),
            &state.phone_digits,
        )
    }

    /// Assemble the submission payload from the current selections.
    ///
    /// Returns `None` until country, state, and district are all chosen
    /// and at least one phone digit has been entered.
    pub fn submission(&self) -> Option<FormSubmission> {
        let state = self.state.lock();
        if state.phone_digits.is_empty() {
            return None;
        }
        let country = state
            .countries
            .iter()
            .find(|c| Some(c.code) == state.selected_country)?;
        let chosen_state = state
            .states
            .iter()
            .find(|s| Some(s.state_id) == state.selected_state)?;
        let district = state
            .districts
            .iter()
            .find(|d| Some(d.district_id) == state.selected_district)?;
        Some(FormSubmission {
            country: country.name.clone(),
            state: chosen_state.state_name.clone(),
            district: district.district_name.clone(),
            phone_number: format_phone_number(
                state.dial_code.as_ref().map(|d| d.dial_code),
                &state.phone_digits,
            ),
        })
    }

    /// Return the whole form to its initial state in one atomic
    /// transition: selections unset, lists empty, dial code and phone
    /// cleared, no loading flags, no error indicators. In-flight fetches
    /// are invalidated; no network call is issued.
    pub fn reset_form(&self) {
        let mut state = self.state.lock();
        self.country_generation.fetch_add(1, Ordering::SeqCst);
        self.state_generation.fetch_add(1, Ordering::SeqCst);
        *state = SelectionState::default();
    }

    /// Drop every cached geo response.
    pub fn clear_cache(&self) {
        self.client.clear_cache();
    }

    /// Current cache entry count and keys, for diagnostics.
    pub fn cache_stats(&self) -> (usize, Vec<String>) {
        (self.client.cache_len(), self.client.cache_keys())
    }

    fn clear_downstream_of_country(state: &mut SelectionState) {
        state.selected_state = None;
        state.states.clear();
        state.dial_code = None;
        state.errors.states = None;
        state.errors.dial_code = None;
        state.loading.states = false;
        state.loading.dial_code = false;
        Self::clear_downstream_of_state(state);
    }

    fn clear_downstream_of_state(state: &mut SelectionState) {
        state.selected_district = None;
        state.districts.clear();
        state.errors.districts = None;
        state.loading.districts = false;
    }
}
