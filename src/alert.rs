//! Alert system for displaying success and error messages to users.
//!
//! Alerts are rendered as HTML fragments that htmx swaps into the
//! `#alert-container` element of the base page.

use maud::{Markup, html};

/// An alert message with a short summary and optional details.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    Success { message: String, details: String },
    Error { message: String, details: String },
}

impl Alert {
    /// Create an error alert without details.
    pub fn error_simple(message: &str) -> Self {
        Self::Error {
            message: message.to_owned(),
            details: String::new(),
        }
    }

    pub fn into_html(self) -> Markup {
        let (container_style, message, details) = match self {
            Alert::Success { message, details } => (
                "p-4 mb-4 text-sm text-green-800 rounded-lg bg-green-50 \
                dark:bg-gray-800 dark:text-green-400 border border-green-300 \
                dark:border-green-800",
                message,
                details,
            ),
            Alert::Error { message, details } => (
                "p-4 mb-4 text-sm text-red-800 rounded-lg bg-red-50 \
                dark:bg-gray-800 dark:text-red-400 border border-red-300 \
                dark:border-red-800",
                message,
                details,
            ),
        };

        html! {
            div
                id="alert-container"
                hx-swap-oob="true"
                class="w-full max-w-md px-4"
                style="position: fixed; bottom: 1rem; left: 50%; transform: translateX(-50%); z-index: 9999;"
            {
                div class=(container_style) role="alert"
                {
                    div class="flex items-start justify-between gap-4"
                    {
                        div
                        {
                            span class="font-medium" { (message) }

                            @if !details.is_empty() {
                                p class="mt-1" { (details) }
                            }
                        }

                        button
                            type="button"
                            aria-label="Close"
                            onclick="this.closest('#alert-container').classList.add('hidden')"
                        {
                            "✕"
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use scraper::{Html, Selector};

    use super::Alert;

    #[test]
    fn error_alert_shows_message_and_details() {
        let alert = Alert::Error {
            message: "Failed to delete".to_owned(),
            details: "permission denied".to_owned(),
        };

        let html = Html::parse_fragment(&alert.into_html().into_string());

        let message = html
            .select(&Selector::parse("span.font-medium").unwrap())
            .next()
            .expect("no message");
        assert_eq!(message.text().collect::<String>(), "Failed to delete");

        let details = html
            .select(&Selector::parse("p").unwrap())
            .next()
            .expect("no details");
        assert_eq!(details.text().collect::<String>(), "permission denied");
    }

    #[test]
    fn simple_alert_has_no_details() {
        let html = Html::parse_fragment(
            &Alert::error_simple("Enter your email")
                .into_html()
                .into_string(),
        );

        assert!(html.select(&Selector::parse("p").unwrap()).next().is_none());
    }
}
