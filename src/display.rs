//! Score display element
//!
//! The element carries the score twice: as visible text and as a hidden
//! attribute (`data-v` by default). Both must equal the protected score; any
//! difference is treated as tampering.

use std::cell::RefCell;
use std::rc::Rc;

/// Default hidden attribute name
pub const DEFAULT_VALUE_ATTRIBUTE: &str = "data-v";

/// Read/write access to the two representations
pub trait ScoreDisplay {
    fn text(&self) -> Option<String>;
    fn set_text(&self, text: &str);
    fn value_attribute(&self) -> Option<String>;
    fn set_value_attribute(&self, value: &str);

    /// Whether both representations show `rendered`
    fn shows(&self, rendered: &str) -> bool {
        self.text().as_deref() == Some(rendered)
            && self.value_attribute().as_deref() == Some(rendered)
    }

    /// Overwrite both representations
    fn render(&self, rendered: &str) {
        self.set_text(rendered);
        self.set_value_attribute(rendered);
    }
}

/// In-memory element for native builds and tests. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryDisplay {
    inner: Rc<RefCell<MemoryDisplayState>>,
}

#[derive(Debug, Default)]
struct MemoryDisplayState {
    text: Option<String>,
    value: Option<String>,
}

impl MemoryDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn showing(text: &str, value: &str) -> Self {
        let display = Self::new();
        display.set_text(text);
        display.set_value_attribute(value);
        display
    }
}

impl ScoreDisplay for MemoryDisplay {
    fn text(&self) -> Option<String> {
        self.inner.borrow().text.clone()
    }

    fn set_text(&self, text: &str) {
        self.inner.borrow_mut().text = Some(text.to_string());
    }

    fn value_attribute(&self) -> Option<String> {
        self.inner.borrow().value.clone()
    }

    fn set_value_attribute(&self, value: &str) {
        self.inner.borrow_mut().value = Some(value.to_string());
    }
}

/// A DOM element (WASM only)
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone)]
pub struct DomScoreDisplay {
    element: web_sys::Element,
    attribute: String,
}

#[cfg(target_arch = "wasm32")]
impl DomScoreDisplay {
    pub fn new(element: web_sys::Element, attribute: impl Into<String>) -> Self {
        Self {
            element,
            attribute: attribute.into(),
        }
    }

    /// Look up an element by id in the current document
    pub fn by_id(id: &str, attribute: impl Into<String>) -> Option<Self> {
        let element = web_sys::window()?.document()?.get_element_by_id(id)?;
        Some(Self::new(element, attribute))
    }
}

#[cfg(target_arch = "wasm32")]
impl ScoreDisplay for DomScoreDisplay {
    fn text(&self) -> Option<String> {
        self.element.text_content()
    }

    fn set_text(&self, text: &str) {
        self.element.set_text_content(Some(text));
    }

    fn value_attribute(&self) -> Option<String> {
        self.element.get_attribute(&self.attribute)
    }

    fn set_value_attribute(&self, value: &str) {
        if let Err(e) = self.element.set_attribute(&self.attribute, value) {
            log::warn!("Could not set {}: {:?}", self.attribute, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_display_shows_nothing() {
        let display = MemoryDisplay::new();
        assert!(!display.shows("0"));
    }

    #[test]
    fn test_both_representations_must_match() {
        assert!(MemoryDisplay::showing("42", "42").shows("42"));
        assert!(!MemoryDisplay::showing("99", "42").shows("42"));
        assert!(!MemoryDisplay::showing("42", "7").shows("42"));
    }

    #[test]
    fn test_render_overwrites_both() {
        let display = MemoryDisplay::showing("99", "7");
        display.render("42");
        assert_eq!(display.text().as_deref(), Some("42"));
        assert_eq!(display.value_attribute().as_deref(), Some("42"));
    }
}
