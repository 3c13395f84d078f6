//! The navigation bar shown at the top of every page after onboarding.

use maud::{Markup, html};

use crate::{auth::AuthProvider, endpoints, html::ICON_BUTTON_STYLE};

/// Template for a link in the navigation bar.
///
/// It will change appearance if `is_current` is set to
/// `true`. Only one link should be set as active at any one time.
#[derive(Clone)]
struct Link<'a> {
    url: &'a str,
    title: &'a str,
    is_current: bool,
}

impl Link<'_> {
    fn into_html(self) -> Markup {
        let style = if self.is_current {
            "block py-2 px-3 text-white bg-blue-700 rounded-sm sm:bg-transparent
        sm:text-blue-700 sm:p-0 dark:text-white sm:dark:text-blue-500"
        } else {
            "block py-2 px-3 text-gray-900 rounded-sm hover:bg-gray-100
        sm:hover:bg-transparent sm:border-0 sm:hover:text-blue-700 sm:p-0
        dark:text-white sm:dark:hover:text-blue-500 dark:hover:bg-gray-700
        dark:hover:text-white sm:dark:hover:bg-transparent"
        };

        html!(
            a
                href=(self.url)
                class=(style)
                aria-current=[self.is_current.then_some("page")]
            {
                (self.title)
            }
        )
    }
}

/// Whether the sign in controls should offer to sign in or out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// No sign in provider is configured, so there is nothing to sign in to.
    Unavailable,
    SignedOut,
    SignedIn,
}

impl SessionStatus {
    pub fn from_provider(auth: Option<&dyn AuthProvider>) -> Self {
        match auth {
            None => SessionStatus::Unavailable,
            Some(auth) if auth.session().is_some() => SessionStatus::SignedIn,
            Some(_) => SessionStatus::SignedOut,
        }
    }
}

pub struct NavBar<'a> {
    links: Vec<Link<'a>>,
    session_status: SessionStatus,
}

impl NavBar<'_> {
    /// Get the navigation bar.
    ///
    /// If a link matches `active_endpoint`, then that link will be
    /// marked as active and displayed differently in the HTML.
    pub fn new(active_endpoint: &str, session_status: SessionStatus) -> NavBar<'_> {
        let links = [
            (endpoints::ROOT, "Home"),
            (endpoints::ANALYTICS_VIEW, "Analytics"),
        ]
        .into_iter()
        .map(|(url, title)| Link {
            url,
            title,
            is_current: active_endpoint == url,
        })
        .collect();

        NavBar {
            links,
            session_status,
        }
    }

    pub fn into_html(self) -> Markup {
        // Template adapted from https://flowbite.com/docs/components/navbar/#default-navbar
        html!(
            nav class="bg-white border-gray-200 dark:bg-gray-900"
            {
                div
                    class="max-w-screen-xl flex flex-wrap items-center justify-between mx-auto p-4 gap-4"
                {
                    a
                        href=(endpoints::ROOT)
                        class="flex items-center space-x-3 rtl:space-x-reverse"
                    {
                        span
                            class="self-center text-2xl font-semibold whitespace-nowrap dark:text-white"
                        {
                            "Budget Bud"
                        }
                    }

                    div class="flex items-center gap-4"
                    {
                        ul class="font-medium flex flex-row gap-4"
                        {
                            @for link in self.links {
                                li { (link.into_html()) }
                            }
                        }

                        button
                            type="button"
                            id="theme-toggle"
                            aria-label="Toggle dark mode"
                            hx-post=(endpoints::THEME)
                            hx-target-error="#alert-container"
                            class=(ICON_BUTTON_STYLE)
                        {
                            "◐"
                        }

                        @match self.session_status {
                            SessionStatus::SignedIn => {
                                button
                                    type="button"
                                    id="sign-out"
                                    hx-post=(endpoints::SIGN_OUT_API)
                                    hx-target-error="#alert-container"
                                    class="text-sm text-gray-700 dark:text-gray-200 hover:underline"
                                {
                                    "Sign out"
                                }
                            }
                            SessionStatus::SignedOut => {
                                a
                                    href=(endpoints::SIGN_IN_VIEW)
                                    id="sign-in"
                                    class="text-sm text-gray-700 dark:text-gray-200 hover:underline"
                                {
                                    "Sign in"
                                }
                            }
                            SessionStatus::Unavailable => {}
                        }
                    }
                }
            }
        )
    }
}
