//! Shipping address type and field-level validation errors.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Default destination country.
pub const DEFAULT_COUNTRY: &str = "US";

/// A named field of a [`ShippingAddress`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressField {
    FullName,
    Phone,
    AddressLine1,
    AddressLine2,
    City,
    State,
    PostalCode,
    Country,
}

impl AddressField {
    /// Every field, in form order.
    pub const ALL: [Self; 8] = [
        Self::FullName,
        Self::Phone,
        Self::AddressLine1,
        Self::AddressLine2,
        Self::City,
        Self::State,
        Self::PostalCode,
        Self::Country,
    ];

    /// Fields that must be non-empty before an order can be placed.
    pub const REQUIRED: [Self; 7] = [
        Self::FullName,
        Self::Phone,
        Self::AddressLine1,
        Self::City,
        Self::State,
        Self::PostalCode,
        Self::Country,
    ];

    /// The wire name of this field.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FullName => "full_name",
            Self::Phone => "phone",
            Self::AddressLine1 => "address_line1",
            Self::AddressLine2 => "address_line2",
            Self::City => "city",
            Self::State => "state",
            Self::PostalCode => "postal_code",
            Self::Country => "country",
        }
    }

    /// Look up a field by its wire name.
    #[must_use]
    pub fn from_wire(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.as_str() == name)
    }
}

impl fmt::Display for AddressField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single rejected input field, either detected locally or reported by
/// the pricing service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Wire name of the offending field (e.g. `phone`).
    pub field: String,
    /// Human-readable reason.
    pub message: String,
}

impl FieldError {
    /// Create a field error.
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    /// The address field this error refers to, if it names one.
    #[must_use]
    pub fn address_field(&self) -> Option<AddressField> {
        AddressField::from_wire(&self.field)
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Errors produced by [`ShippingAddress::validate`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    /// One or more required fields are empty.
    #[error("missing required address fields: {}", join_fields(.0))]
    MissingFields(Vec<AddressField>),
}

impl AddressError {
    /// Per-field errors suitable for display next to each input.
    #[must_use]
    pub fn field_errors(&self) -> Vec<FieldError> {
        match self {
            Self::MissingFields(fields) => fields
                .iter()
                .map(|field| FieldError::new(field.as_str(), "field required"))
                .collect(),
        }
    }
}

fn join_fields(fields: &[AddressField]) -> String {
    fields
        .iter()
        .map(|f| f.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Where a cash-on-delivery order should be shipped.
///
/// Values are opaque strings; only presence is checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub full_name: String,
    pub phone: String,
    pub address_line1: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    #[serde(default = "default_country")]
    pub country: String,
}

fn default_country() -> String {
    DEFAULT_COUNTRY.to_owned()
}

impl Default for ShippingAddress {
    fn default() -> Self {
        Self {
            full_name: String::new(),
            phone: String::new(),
            address_line1: String::new(),
            address_line2: None,
            city: String::new(),
            state: String::new(),
            postal_code: String::new(),
            country: default_country(),
        }
    }
}

impl ShippingAddress {
    /// Value of a field; `None` for an absent optional line.
    #[must_use]
    pub fn get(&self, field: AddressField) -> Option<&str> {
        match field {
            AddressField::FullName => Some(&self.full_name),
            AddressField::Phone => Some(&self.phone),
            AddressField::AddressLine1 => Some(&self.address_line1),
            AddressField::AddressLine2 => self.address_line2.as_deref(),
            AddressField::City => Some(&self.city),
            AddressField::State => Some(&self.state),
            AddressField::PostalCode => Some(&self.postal_code),
            AddressField::Country => Some(&self.country),
        }
    }

    /// Set a field from user input. An empty second address line is
    /// stored as `None`.
    pub fn set(&mut self, field: AddressField, value: impl Into<String>) {
        let value = value.into();
        match field {
            AddressField::FullName => self.full_name = value,
            AddressField::Phone => self.phone = value,
            AddressField::AddressLine1 => self.address_line1 = value,
            AddressField::AddressLine2 => {
                self.address_line2 = (!value.trim().is_empty()).then_some(value);
            }
            AddressField::City => self.city = value,
            AddressField::State => self.state = value,
            AddressField::PostalCode => self.postal_code = value,
            AddressField::Country => self.country = value,
        }
    }

    /// Required fields that are empty or whitespace-only, in form order.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<AddressField> {
        AddressField::REQUIRED
            .into_iter()
            .filter(|&field| self.get(field).is_none_or(|v| v.trim().is_empty()))
            .collect()
    }

    /// Check that every required field is present.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError::MissingFields`] listing each empty required field.
    pub fn validate(&self) -> Result<(), AddressError> {
        let missing = self.missing_fields();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(AddressError::MissingFields(missing))
        }
    }
}
