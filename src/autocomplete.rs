//! A text input with a filtered list of suggestions.
//!
//! The widget state lives in the page. Each user event posts that state plus
//! the event to [autocomplete_endpoint], which applies the event and renders
//! the widget again.

use axum::response::{IntoResponse, Response};
use axum_extra::extract::Form;
use maud::{Markup, html};
use serde::Deserialize;

use crate::{
    endpoints,
    html::FORM_TEXT_INPUT_STYLE,
    transaction::{CATEGORY_OPTIONS, merchant_options},
};

/// How many options are suggested while the input is empty.
pub const DEFAULT_SUGGESTION_COUNT: usize = 6;

const OPTION_STYLE: &str = "px-3 py-2 cursor-pointer hover:bg-gray-100 dark:hover:bg-gray-600";
const FOCUSED_OPTION_STYLE: &str = "px-3 py-2 cursor-pointer bg-blue-100 dark:bg-blue-900";

/// A key press the dropdown reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowDown,
    ArrowUp,
    Enter,
    Escape,
    Other,
}

impl Key {
    /// Map a DOM `KeyboardEvent.key` value to a [Key].
    pub fn from_dom_key(key: &str) -> Self {
        match key {
            "ArrowDown" => Key::ArrowDown,
            "ArrowUp" => Key::ArrowUp,
            "Enter" => Key::Enter,
            "Escape" => Key::Escape,
            _ => Key::Other,
        }
    }
}

/// The state of a single-select input with suggestions.
#[derive(Debug, Clone, PartialEq)]
pub struct Autocomplete {
    options: Vec<String>,
    value: String,
    open: bool,
    show_all: bool,
    focused_index: Option<usize>,
}

impl Autocomplete {
    /// A closed dropdown over `options` with `value` in the input.
    pub fn new(options: Vec<String>, value: impl Into<String>) -> Self {
        Self {
            options,
            value: value.into(),
            open: false,
            show_all: false,
            focused_index: None,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn is_showing_all(&self) -> bool {
        self.show_all
    }

    pub fn focused_index(&self) -> Option<usize> {
        self.focused_index
    }

    /// The user typed `text` into the input.
    pub fn input(&mut self, text: &str) {
        self.value = text.to_owned();
        self.open = true;
        self.show_all = false;
        self.focused_index = None;
    }

    pub fn focus(&mut self) {
        self.open = true;
    }

    /// The options currently offered to the user.
    ///
    /// Shows every option in show-all mode, otherwise the options containing
    /// the input text (ignoring case), or the first few options when the
    /// input is empty.
    pub fn filtered(&self) -> Vec<&str> {
        if self.show_all {
            return self.options.iter().map(String::as_str).collect();
        }

        if self.value.is_empty() {
            return self
                .options
                .iter()
                .take(DEFAULT_SUGGESTION_COUNT)
                .map(String::as_str)
                .collect();
        }

        let needle = self.value.to_lowercase();

        self.options
            .iter()
            .filter(|option| option.to_lowercase().contains(&needle))
            .map(String::as_str)
            .collect()
    }

    /// The dropdown button was pressed.
    ///
    /// Opens the full list unless the full list is already open, in which
    /// case the dropdown closes.
    pub fn toggle(&mut self) {
        let will_open = !self.open || !self.show_all;

        self.open = will_open;
        self.show_all = will_open;
        self.focused_index = None;
    }

    /// Keyboard navigation. Ignored while the dropdown is closed.
    pub fn key_down(&mut self, key: Key) {
        if !self.open {
            return;
        }

        match key {
            Key::ArrowDown => {
                let match_count = self.filtered().len();
                let next = self.focused_index.map_or(0, |index| index + 1);

                self.focused_index = match_count.checked_sub(1).map(|last| next.min(last));
            }
            Key::ArrowUp => {
                self.focused_index = Some(self.focused_index.unwrap_or(0).saturating_sub(1));
            }
            Key::Enter => {
                let focused_option = self
                    .focused_index
                    .and_then(|index| self.filtered().get(index).map(|option| option.to_string()));

                if let Some(option) = focused_option {
                    self.value = option;
                }

                self.close();
            }
            Key::Escape => self.close(),
            Key::Other => {}
        }
    }

    /// The user picked `option` from the list.
    pub fn select(&mut self, option: &str) {
        self.value = option.to_owned();
        self.close();
    }

    /// A pointer was pressed somewhere on the page.
    pub fn pointer_down(&mut self, inside: bool) {
        if !inside {
            self.close();
        }
    }

    fn close(&mut self) {
        self.open = false;
        self.show_all = false;
        self.focused_index = None;
    }

    /// Render the widget for `field`.
    pub fn view(&self, field: AutocompleteField) -> Markup {
        let container_id = format!("{}-autocomplete", field.name());
        let filtered = self.filtered();

        let mut state = serde_json::json!({
            "field": field.name(),
            "open": self.open,
            "show_all": self.show_all,
        });
        if let Some(index) = self.focused_index {
            state["focused_index"] = index.into();
        }

        html! {
            div
                id=(container_id)
                class="autocomplete relative"
                hx-target={ "#" (container_id) }
                hx-swap="outerHTML"
                hx-target-error="#alert-container"
                hx-vals=(state.to_string())
            {
                div class="relative"
                {
                    input
                        id=(field.name())
                        name=(field.name())
                        type="text"
                        value=(self.value)
                        placeholder=(field.placeholder())
                        autocomplete="off"
                        role="combobox"
                        aria-expanded=(if self.open { "true" } else { "false" })
                        data-open=[self.open.then_some("true")]
                        hx-post=(endpoints::AUTOCOMPLETE)
                        hx-trigger="input changed delay:200ms, \
                            focus[this.dataset.open!=='true'], \
                            keydown[key=='ArrowDown'||key=='ArrowUp'||key=='Enter'||key=='Escape']"
                        hx-vals="js:{action: event.type, key: event.key || ''}"
                        onkeydown="if (event.key === 'Enter' && this.dataset.open === 'true') event.preventDefault();"
                        class={ (FORM_TEXT_INPUT_STYLE) " pr-10" };

                    button
                        type="button"
                        aria-label="Toggle suggestions"
                        hx-post=(endpoints::AUTOCOMPLETE)
                        hx-vals=r#"{"action": "toggle"}"#
                        class="absolute inset-y-0 right-0 px-3 text-gray-500 dark:text-gray-400"
                    {
                        "▾"
                    }
                }

                @if self.open && !filtered.is_empty() {
                    ul
                        role="listbox"
                        class="absolute z-10 mt-1 w-full max-h-60 overflow-auto rounded
                            bg-white dark:bg-gray-700 border border-gray-300
                            dark:border-gray-600 shadow"
                    {
                        @for (index, option) in filtered.iter().enumerate() {
                            @let is_focused = self.focused_index == Some(index);
                            @let option_style = if is_focused {
                                FOCUSED_OPTION_STYLE
                            } else {
                                OPTION_STYLE
                            };

                            li
                                role="option"
                                aria-selected=(if is_focused { "true" } else { "false" })
                                hx-post=(endpoints::AUTOCOMPLETE)
                                hx-trigger="mousedown"
                                hx-vals=(serde_json::json!({"action": "select", "option": option}).to_string())
                                class=(option_style)
                            {
                                (option)
                            }
                        }
                    }
                }

                @if self.open {
                    div
                        hidden
                        hx-post=(endpoints::AUTOCOMPLETE)
                        hx-trigger="mousedown[!this.closest('.autocomplete').contains(event.target)] from:document"
                        hx-vals=r#"{"action": "outside"}"#
                    {}
                }
            }
        }
    }
}

/// The transaction form inputs that offer suggestions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutocompleteField {
    Category,
    Merchant,
}

impl AutocompleteField {
    /// The form field name of the input.
    pub fn name(self) -> &'static str {
        match self {
            AutocompleteField::Category => "category",
            AutocompleteField::Merchant => "merchant",
        }
    }

    fn placeholder(self) -> &'static str {
        match self {
            AutocompleteField::Category => "Category",
            AutocompleteField::Merchant => "Merchant",
        }
    }

    /// The suggestions for this field. Merchants depend on the chosen category.
    pub fn options(self, category: &str) -> Vec<String> {
        match self {
            AutocompleteField::Category => CATEGORY_OPTIONS
                .iter()
                .map(|option| option.to_string())
                .collect(),
            AutocompleteField::Merchant => merchant_options(category)
                .iter()
                .map(|option| option.to_string())
                .collect(),
        }
    }

    /// A closed widget for this field showing `value`.
    pub fn widget(self, value: &str, category: &str) -> Markup {
        Autocomplete::new(self.options(category), value).view(self)
    }
}

/// The event that caused the widget to post its state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AutocompleteAction {
    Input,
    Focus,
    Keydown,
    Toggle,
    Select,
    Outside,
}

/// The widget state and event posted by the page.
///
/// The current text is read from the field named by `field`, and `category`
/// is also used to pick the merchant suggestions.
#[derive(Debug, Deserialize)]
pub struct AutocompleteForm {
    pub field: AutocompleteField,
    pub action: AutocompleteAction,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub merchant: String,
    #[serde(default)]
    pub open: bool,
    #[serde(default)]
    pub show_all: bool,
    #[serde(default)]
    pub focused_index: Option<usize>,
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub option: String,
}

/// A route handler that applies one event to an autocomplete widget and
/// responds with the updated widget.
pub async fn autocomplete_endpoint(Form(form): Form<AutocompleteForm>) -> Response {
    let value = match form.field {
        AutocompleteField::Category => &form.category,
        AutocompleteField::Merchant => &form.merchant,
    };

    let mut autocomplete = Autocomplete {
        options: form.field.options(&form.category),
        value: value.clone(),
        open: form.open,
        show_all: form.show_all,
        focused_index: form.focused_index,
    };

    match form.action {
        AutocompleteAction::Input => autocomplete.input(value),
        AutocompleteAction::Focus => autocomplete.focus(),
        AutocompleteAction::Keydown => autocomplete.key_down(Key::from_dom_key(&form.key)),
        AutocompleteAction::Toggle => autocomplete.toggle(),
        AutocompleteAction::Select => autocomplete.select(&form.option),
        AutocompleteAction::Outside => autocomplete.pointer_down(false),
    }

    autocomplete.view(form.field).into_response()
}

#[cfg(test)]
mod autocomplete_tests {
    use super::{Autocomplete, Key};

    fn options(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    fn groceries() -> Autocomplete {
        Autocomplete::new(
            options(&["Target", "Walmart", "Wegmans", "Costco", "Harris Teeter"]),
            "",
        )
    }

    #[test]
    fn empty_value_shows_first_options() {
        let autocomplete = Autocomplete::new(options(&["Target", "Walmart"]), "");

        assert_eq!(autocomplete.filtered(), vec!["Target", "Walmart"]);
    }

    #[test]
    fn empty_value_shows_at_most_six_options() {
        let autocomplete = Autocomplete::new(options(&["a", "b", "c", "d", "e", "f", "g"]), "");

        assert_eq!(autocomplete.filtered(), vec!["a", "b", "c", "d", "e", "f"]);
    }

    #[test]
    fn filters_by_case_insensitive_substring() {
        let mut autocomplete = Autocomplete::new(options(&["Target", "Walmart"]), "");

        autocomplete.input("tar");

        assert_eq!(autocomplete.filtered(), vec!["Target"]);
        assert!(autocomplete.is_open());
    }

    #[test]
    fn show_all_ignores_value() {
        let mut autocomplete = groceries();
        autocomplete.input("zzz");
        assert!(autocomplete.filtered().is_empty());

        autocomplete.toggle();

        assert_eq!(autocomplete.filtered().len(), 5);
        assert!(autocomplete.is_showing_all());
    }

    #[test]
    fn toggle_opens_then_closes() {
        let mut autocomplete = groceries();

        autocomplete.toggle();
        assert!(autocomplete.is_open());
        assert!(autocomplete.is_showing_all());

        autocomplete.toggle();
        assert!(!autocomplete.is_open());
        assert!(!autocomplete.is_showing_all());
    }

    #[test]
    fn toggle_while_open_from_typing_switches_to_show_all() {
        let mut autocomplete = groceries();
        autocomplete.input("wa");

        autocomplete.toggle();

        assert!(autocomplete.is_open());
        assert!(autocomplete.is_showing_all());
        assert_eq!(autocomplete.focused_index(), None);
    }

    #[test]
    fn keys_are_ignored_while_closed() {
        let mut autocomplete = groceries();

        autocomplete.key_down(Key::ArrowDown);

        assert_eq!(autocomplete.focused_index(), None);
    }

    #[test]
    fn arrow_keys_clamp_to_matches() {
        let mut autocomplete = groceries();
        autocomplete.input("w");
        assert_eq!(autocomplete.filtered(), vec!["Walmart", "Wegmans"]);

        autocomplete.key_down(Key::ArrowDown);
        assert_eq!(autocomplete.focused_index(), Some(0));
        autocomplete.key_down(Key::ArrowDown);
        autocomplete.key_down(Key::ArrowDown);
        assert_eq!(autocomplete.focused_index(), Some(1));

        autocomplete.key_down(Key::ArrowUp);
        autocomplete.key_down(Key::ArrowUp);
        assert_eq!(autocomplete.focused_index(), Some(0));
    }

    #[test]
    fn arrow_down_without_matches_focuses_nothing() {
        let mut autocomplete = groceries();
        autocomplete.input("zzz");

        autocomplete.key_down(Key::ArrowDown);

        assert_eq!(autocomplete.focused_index(), None);
    }

    #[test]
    fn enter_commits_focused_option_and_closes() {
        let mut autocomplete = groceries();
        autocomplete.input("w");
        autocomplete.key_down(Key::ArrowDown);
        autocomplete.key_down(Key::ArrowDown);

        autocomplete.key_down(Key::Enter);

        assert_eq!(autocomplete.value(), "Wegmans");
        assert!(!autocomplete.is_open());
        assert_eq!(autocomplete.focused_index(), None);
    }

    #[test]
    fn enter_without_focus_keeps_typed_value() {
        let mut autocomplete = groceries();
        autocomplete.input("Trader Joe's");

        autocomplete.key_down(Key::Enter);

        assert_eq!(autocomplete.value(), "Trader Joe's");
        assert!(!autocomplete.is_open());
    }

    #[test]
    fn escape_closes_without_committing() {
        let mut autocomplete = groceries();
        autocomplete.input("t");
        autocomplete.key_down(Key::ArrowDown);

        autocomplete.key_down(Key::Escape);

        assert_eq!(autocomplete.value(), "t");
        assert!(!autocomplete.is_open());
    }

    #[test]
    fn select_commits_and_closes() {
        let mut autocomplete = groceries();
        autocomplete.toggle();

        autocomplete.select("Costco");

        assert_eq!(autocomplete.value(), "Costco");
        assert!(!autocomplete.is_open());
        assert!(!autocomplete.is_showing_all());
    }

    #[test]
    fn pointer_down_outside_closes() {
        let mut autocomplete = groceries();
        autocomplete.focus();

        autocomplete.pointer_down(true);
        assert!(autocomplete.is_open());

        autocomplete.pointer_down(false);
        assert!(!autocomplete.is_open());
    }
}
