//! Static button catalog.
//!
//! The catalog is supplied by the host at startup (typically server-rendered
//! JSON). Descriptors are read leniently: validity is decided later, when the
//! registry is built.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

// ============================================================================
// ButtonDescriptor
// ============================================================================

/// One entry of the button catalog.
///
/// # Format
///
/// ```json
/// { "key": "btn_a", "image_url": "/static/images/buttons/a.png", "image_name": "a.png" }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonDescriptor {
    /// Registry key shared with the server.
    #[serde(default)]
    pub key: Option<String>,

    /// URL of the overlay image.
    #[serde(default)]
    pub image_url: Option<String>,

    /// Display name of the image, used as alt text.
    #[serde(default)]
    pub image_name: Option<String>,
}

impl ButtonDescriptor {
    /// Creates a descriptor with key and image URL.
    #[inline]
    #[must_use]
    pub fn new(key: impl Into<String>, image_url: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            image_url: Some(image_url.into()),
            image_name: None,
        }
    }

    /// Sets the image name.
    #[inline]
    #[must_use]
    pub fn with_image_name(mut self, name: impl Into<String>) -> Self {
        self.image_name = Some(name.into());
        self
    }

    /// Returns the key if it is present and non-empty.
    #[inline]
    #[must_use]
    pub fn valid_key(&self) -> Option<&str> {
        self.key.as_deref().filter(|k| !k.is_empty())
    }

    /// Returns the image URL if it is present and non-empty.
    #[inline]
    #[must_use]
    pub fn valid_image_url(&self) -> Option<&str> {
        self.image_url.as_deref().filter(|u| !u.is_empty())
    }

    /// Returns `true` if this descriptor can produce a registry entry.
    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.valid_key().is_some() && self.valid_image_url().is_some()
    }
}

// ============================================================================
// ButtonCatalog
// ============================================================================

/// Ordered list of button descriptors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ButtonCatalog {
    descriptors: Vec<ButtonDescriptor>,
}

impl ButtonCatalog {
    /// Creates a catalog from descriptors.
    #[inline]
    #[must_use]
    pub fn new(descriptors: Vec<ButtonDescriptor>) -> Self {
        Self { descriptors }
    }

    /// Parses a JSON array of descriptors.
    ///
    /// # Errors
    ///
    /// - [`crate::Error::Json`] if the text is not JSON or an entry is not an object
    /// - [`crate::Error::InvalidCatalog`] if the top-level value is not an array
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        if !value.is_array() {
            return Err(Error::invalid_catalog(format!(
                "expected an array of descriptors, got {}",
                json_kind(&value)
            )));
        }

        Ok(serde_json::from_value(value)?)
    }

    /// Returns the descriptors in catalog order.
    #[inline]
    #[must_use]
    pub fn descriptors(&self) -> &[ButtonDescriptor] {
        &self.descriptors
    }

    /// Returns the number of descriptors, valid or not.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Returns `true` if the catalog is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

impl From<Vec<ButtonDescriptor>> for ButtonCatalog {
    fn from(descriptors: Vec<ButtonDescriptor>) -> Self {
        Self::new(descriptors)
    }
}

impl FromIterator<ButtonDescriptor> for ButtonCatalog {
    fn from_iter<I: IntoIterator<Item = ButtonDescriptor>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// Names the JSON type of `value` for error messages.
fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ============================================================================
// Tests
// ============================================================================
