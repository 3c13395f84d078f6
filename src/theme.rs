//! The light/dark theme preference and the endpoint for toggling it.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use axum_htmx::HxRefresh;

use crate::{Error, preferences::SharedPreferences};

/// The client hint header browsers use to report their preferred colour scheme.
pub const PREFERS_COLOR_SCHEME_HEADER: &str = "sec-ch-prefers-color-scheme";

/// The theme chosen by the user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Theme {
    /// Follow the colour scheme of the user's device.
    #[default]
    System,
    Light,
    Dark,
}

/// The colour scheme that is actually rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorScheme {
    Light,
    Dark,
}

impl ColorScheme {
    pub fn as_str(self) -> &'static str {
        match self {
            ColorScheme::Light => "light",
            ColorScheme::Dark => "dark",
        }
    }

    fn opposite(self) -> Self {
        match self {
            ColorScheme::Light => ColorScheme::Dark,
            ColorScheme::Dark => ColorScheme::Light,
        }
    }
}

impl Theme {
    /// The colour scheme to render given the device's preferred scheme.
    pub fn effective(self, preferred: ColorScheme) -> ColorScheme {
        match self {
            Theme::System => preferred,
            Theme::Light => ColorScheme::Light,
            Theme::Dark => ColorScheme::Dark,
        }
    }

    /// The theme after the user presses the theme toggle.
    ///
    /// Toggling away from [Theme::System] picks the opposite of what is
    /// currently displayed, so the first press always changes the page.
    pub fn toggle(self, preferred: ColorScheme) -> Theme {
        match self.effective(preferred).opposite() {
            ColorScheme::Light => Theme::Light,
            ColorScheme::Dark => Theme::Dark,
        }
    }
}

/// Read the preferred colour scheme from the request's client hints.
///
/// Defaults to [ColorScheme::Light] when the browser does not send the hint.
pub fn preferred_color_scheme(headers: &HeaderMap) -> ColorScheme {
    let hint = headers
        .get(PREFERS_COLOR_SCHEME_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim_matches('"').to_ascii_lowercase());

    match hint.as_deref() {
        Some("dark") => ColorScheme::Dark,
        _ => ColorScheme::Light,
    }
}

/// A route handler that toggles the theme and asks htmx to refresh the page.
pub async fn toggle_theme_endpoint(
    State(preferences): State<SharedPreferences>,
    headers: HeaderMap,
) -> Response {
    let preferred = preferred_color_scheme(&headers);

    let mut preferences = match preferences.lock() {
        Ok(preferences) => preferences,
        Err(error) => {
            tracing::error!("could not acquire preferences lock: {error}");
            return Error::PreferencesLockError.into_alert_response();
        }
    };

    preferences.theme = preferences.theme.toggle(preferred);
    tracing::debug!("Theme changed to {:?}", preferences.theme);

    (HxRefresh(true), StatusCode::OK).into_response()
}
