//! Display preferences that last for the lifetime of the server process.
//!
//! Neither the theme nor the budget threshold is written to local storage.

use std::sync::{Arc, LockResult, Mutex, MutexGuard};

use axum::{extract::FromRef, http::HeaderMap};

use crate::{
    AppState, Error,
    theme::{ColorScheme, Theme, preferred_color_scheme},
};

/// The monthly budget used until the user sets a different one.
pub const DEFAULT_BUDGET: f64 = 2000.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Preferences {
    /// The light/dark theme chosen by the user.
    pub theme: Theme,
    /// The monthly spending threshold used by the budget comparison.
    pub budget: f64,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            theme: Theme::System,
            budget: DEFAULT_BUDGET,
        }
    }
}

/// A handle to the preferences shared between route handlers.
#[derive(Debug, Clone, Default)]
pub struct SharedPreferences(Arc<Mutex<Preferences>>);

impl SharedPreferences {
    pub fn new(preferences: Preferences) -> Self {
        Self(Arc::new(Mutex::new(preferences)))
    }

    pub fn lock(&self) -> LockResult<MutexGuard<'_, Preferences>> {
        self.0.lock()
    }

    /// A copy of the current preferences.
    pub fn snapshot(&self) -> Result<Preferences, Error> {
        self.lock()
            .map(|preferences| preferences.clone())
            .map_err(|error| {
                tracing::error!("could not acquire preferences lock: {error}");
                Error::PreferencesLockError
            })
    }

    /// The colour scheme to render for a request with `headers`.
    pub fn color_scheme(&self, headers: &HeaderMap) -> Result<ColorScheme, Error> {
        Ok(self
            .snapshot()?
            .theme
            .effective(preferred_color_scheme(headers)))
    }
}

impl FromRef<AppState> for SharedPreferences {
    fn from_ref(state: &AppState) -> Self {
        state.preferences.clone()
    }
}
