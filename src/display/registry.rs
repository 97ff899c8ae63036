//! Element registry.
//!
//! Maps each registry key to the overlay element created for it. The set of
//! entries is fixed when the registry is built; afterwards only the display
//! state class of an element changes.
//!
//! # Class Layout
//!
//! Every element carries:
//!
//! | Class | Meaning |
//! |-------|---------|
//! | `dynamic-button` | overlay marker |
//! | `z-swing` / `z-buttons` | stacking layer |
//! | `visible` / `hidden` | display state, exactly one at a time |

// ============================================================================
// Imports
// ============================================================================

use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use super::catalog::{ButtonCatalog, ButtonDescriptor};

// ============================================================================
// Constants
// ============================================================================

/// Base class of every overlay element.
pub const BASE_CLASS: &str = "dynamic-button";

/// Keys drawn on the lever layer.
const SWING_KEYS: [&str; 5] = ["lever_-1", "lever_-2", "lever_0", "lever_1", "lever_2"];

// ============================================================================
// DisplayState
// ============================================================================

/// Display state of an overlay element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DisplayState {
    /// Element is shown.
    Visible,
    /// Element is hidden.
    #[default]
    Hidden,
}

impl DisplayState {
    /// Returns the state for a visibility flag.
    #[inline]
    #[must_use]
    pub const fn from_visible(visible: bool) -> Self {
        if visible { Self::Visible } else { Self::Hidden }
    }

    /// Returns the CSS class for this state.
    #[inline]
    #[must_use]
    pub const fn class_name(self) -> &'static str {
        match self {
            Self::Visible => "visible",
            Self::Hidden => "hidden",
        }
    }

    /// Returns the other state.
    #[inline]
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Visible => Self::Hidden,
            Self::Hidden => Self::Visible,
        }
    }
}

// ============================================================================
// Layer
// ============================================================================

/// Stacking layer of an overlay element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    /// Lever positions.
    Swing,
    /// Buttons.
    Buttons,
}

impl Layer {
    /// Picks the layer for a registry key.
    #[must_use]
    pub fn for_key(key: &str) -> Self {
        if SWING_KEYS.contains(&key) {
            Self::Swing
        } else {
            Self::Buttons
        }
    }

    /// Returns the CSS class for this layer.
    #[inline]
    #[must_use]
    pub const fn class_name(self) -> &'static str {
        match self {
            Self::Swing => "z-swing",
            Self::Buttons => "z-buttons",
        }
    }
}

// ============================================================================
// ElementHandle
// ============================================================================

/// An overlay image element owned by the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementHandle {
    key: String,
    image_url: String,
    alt: String,
    layer: Layer,
    classes: Vec<&'static str>,
}

impl ElementHandle {
    /// Creates a hidden element for `key`.
    fn new(key: &str, image_url: &str, image_name: Option<&str>) -> Self {
        let layer = Layer::for_key(key);

        Self {
            key: key.to_string(),
            image_url: image_url.to_string(),
            alt: image_name
                .filter(|n| !n.is_empty())
                .unwrap_or(key)
                .to_string(),
            layer,
            classes: vec![
                BASE_CLASS,
                DisplayState::Hidden.class_name(),
                layer.class_name(),
            ],
        }
    }

    /// Returns the registry key.
    #[inline]
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the image URL.
    #[inline]
    #[must_use]
    pub fn image_url(&self) -> &str {
        &self.image_url
    }

    /// Returns the alt text.
    #[inline]
    #[must_use]
    pub fn alt(&self) -> &str {
        &self.alt
    }

    /// Returns the stacking layer.
    #[inline]
    #[must_use]
    pub fn layer(&self) -> Layer {
        self.layer
    }

    /// Returns the class list in insertion order.
    #[inline]
    #[must_use]
    pub fn class_list(&self) -> &[&'static str] {
        &self.classes
    }

    /// Returns `true` if the element carries `class`.
    #[inline]
    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.contains(&class)
    }

    /// Returns the current display state.
    #[must_use]
    pub fn state(&self) -> DisplayState {
        if self.has_class(DisplayState::Visible.class_name()) {
            DisplayState::Visible
        } else {
            DisplayState::Hidden
        }
    }

    /// Returns `true` if the element is shown.
    #[inline]
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.state() == DisplayState::Visible
    }

    /// Moves the element to `state`.
    ///
    /// The opposite class is removed before the target class is added.
    fn apply_state(&mut self, state: DisplayState) {
        let opposite = state.opposite().class_name();
        self.classes.retain(|c| *c != opposite);

        let target = state.class_name();
        if !self.has_class(target) {
            self.classes.push(target);
        }
    }
}

// ============================================================================
// ElementRegistry
// ============================================================================

/// Key-addressed set of overlay elements.
///
/// Built once from a [`ButtonCatalog`]; entries are never inserted or
/// removed afterwards, only [`clear`](Self::clear)ed on teardown.
#[derive(Debug, Clone, Default)]
pub struct ElementRegistry {
    /// Elements in catalog order.
    elements: Vec<ElementHandle>,
    /// Key to position in `elements`.
    index: FxHashMap<String, usize>,
    /// Descriptors that produced no entry.
    skipped: usize,
}

impl ElementRegistry {
    /// Builds the registry from a catalog.
    ///
    /// Descriptors missing a key or image URL are skipped, as are repeated
    /// keys after their first occurrence.
    #[must_use]
    pub fn build(catalog: &ButtonCatalog) -> Self {
        let mut registry = Self::default();

        for descriptor in catalog.descriptors() {
            registry.register(descriptor);
        }

        debug!(
            created = registry.len(),
            skipped = registry.skipped,
            "Element registry built"
        );

        registry
    }

    fn register(&mut self, descriptor: &ButtonDescriptor) {
        let (Some(key), Some(image_url)) = (descriptor.valid_key(), descriptor.valid_image_url())
        else {
            warn!(?descriptor, "Skipping button descriptor without key or image_url");
            self.skipped += 1;
            return;
        };

        if self.index.contains_key(key) {
            warn!(key, "Skipping duplicate button key");
            self.skipped += 1;
            return;
        }

        let element = ElementHandle::new(key, image_url, descriptor.image_name.as_deref());
        self.index.insert(key.to_string(), self.elements.len());
        self.elements.push(element);
    }

    /// Returns the element registered under `key`.
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&ElementHandle> {
        self.index.get(key).map(|&i| &self.elements[i])
    }

    /// Returns `true` if `key` is registered.
    #[inline]
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Sets the display state of the element under `key`.
    ///
    /// Returns `false` if no element is registered under `key`.
    pub fn set_visible(&mut self, key: &str, visible: bool) -> bool {
        let Some(&i) = self.index.get(key) else {
            return false;
        };

        self.elements[i].apply_state(DisplayState::from_visible(visible));
        true
    }

    /// Returns `true` if the element under `key` is shown.
    #[inline]
    #[must_use]
    pub fn is_visible(&self, key: &str) -> bool {
        self.get(key).is_some_and(ElementHandle::is_visible)
    }

    /// Returns the elements in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &ElementHandle> {
        self.elements.iter()
    }

    /// Returns the number of registered elements.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Returns `true` if nothing is registered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Returns how many descriptors were skipped during the build.
    #[inline]
    #[must_use]
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Releases every element.
    pub fn clear(&mut self) {
        self.elements.clear();
        self.index.clear();
    }
}

// ============================================================================
// Tests
// ============================================================================
