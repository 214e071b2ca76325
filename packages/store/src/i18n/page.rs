//! A minimal model of the translatable parts of a rendered page.
//!
//! The host renders a [`Page`] however it likes; the i18n manager only ever
//! touches the text direction, elements tagged with a translation key, and the
//! language switcher buttons.

use std::fmt;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Ltr,
    Rtl,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Ltr => "ltr",
            Direction::Rtl => "rtl",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a tagged element receives its translation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ElementKind {
    /// Regular element: text content, or markup when the string contains a link.
    Text,
    /// Form field: the translation becomes the placeholder.
    Input,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Content {
    #[default]
    Empty,
    Text(String),
    Html(String),
    Placeholder(String),
}

impl Content {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Content::Empty => None,
            Content::Text(s) | Content::Html(s) | Content::Placeholder(s) => Some(s),
        }
    }
}

/// An element carrying a translation key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Element {
    pub key: String,
    pub kind: ElementKind,
    pub content: Content,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LanguageButton {
    pub lang: String,
    pub active: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Page {
    pub direction: Direction,
    pub elements: Vec<Element>,
    pub language_buttons: Vec<LanguageButton>,
}

impl Page {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, key: impl Into<String>) -> Self {
        self.elements.push(Element {
            key: key.into(),
            kind: ElementKind::Text,
            content: Content::Empty,
        });
        self
    }

    pub fn with_input(mut self, key: impl Into<String>) -> Self {
        self.elements.push(Element {
            key: key.into(),
            kind: ElementKind::Input,
            content: Content::Empty,
        });
        self
    }

    pub fn with_language_button(mut self, lang: impl Into<String>) -> Self {
        self.language_buttons.push(LanguageButton {
            lang: lang.into(),
            active: false,
        });
        self
    }

    pub fn element(&self, key: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.key == key)
    }

    /// Rendered string of the first element tagged with `key`.
    pub fn text_of(&self, key: &str) -> Option<&str> {
        self.element(key).and_then(|e| e.content.as_str())
    }

    pub fn active_language(&self) -> Option<&str> {
        self.language_buttons
            .iter()
            .find(|b| b.active)
            .map(|b| b.lang.as_str())
    }
}
