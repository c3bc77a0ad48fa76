//! Shipping and contact details captured with an order.

use serde::{Deserialize, Serialize};

use super::OrderError;

const ADDRESS_PLACEHOLDER: &str = "No address provided";
const CITY_PLACEHOLDER: &str = "No city provided";
const POSTAL_CODE_PLACEHOLDER: &str = "00000";

/// Customer snapshot stored on an order.
///
/// Address, city and postal code are mandatory; name and email are not.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub name: Option<String>,
    pub email: Option<String>,
    pub address: String,
    pub city: String,
    pub postal_code: String,
}

impl CustomerInfo {
    /// Creates customer info with the mandatory fields.
    pub fn new(
        address: impl Into<String>,
        city: impl Into<String>,
        postal_code: impl Into<String>,
    ) -> Self {
        Self {
            name: None,
            email: None,
            address: address.into(),
            city: city.into(),
            postal_code: postal_code.into(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Trims every field and checks the mandatory ones are non-empty.
    ///
    /// Blank optional fields collapse to `None`.
    pub fn validated(self) -> Result<Self, OrderError> {
        let info = self.trimmed();
        for (field, value) in [
            ("address", &info.address),
            ("city", &info.city),
            ("postal_code", &info.postal_code),
        ] {
            if value.is_empty() {
                return Err(OrderError::InvalidCustomerInfo { field });
            }
        }
        Ok(info)
    }

    /// Fills blank mandatory fields with placeholders instead of rejecting.
    ///
    /// Used where the payment is already captured and the order must be
    /// recorded regardless.
    pub fn with_placeholders(self) -> Self {
        let mut info = self.trimmed();
        if info.address.is_empty() {
            info.address = ADDRESS_PLACEHOLDER.to_string();
        }
        if info.city.is_empty() {
            info.city = CITY_PLACEHOLDER.to_string();
        }
        if info.postal_code.is_empty() {
            info.postal_code = POSTAL_CODE_PLACEHOLDER.to_string();
        }
        info
    }

    fn trimmed(self) -> Self {
        let optional = |value: Option<String>| {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        Self {
            name: optional(self.name),
            email: optional(self.email),
            address: self.address.trim().to_string(),
            city: self.city.trim().to_string(),
            postal_code: self.postal_code.trim().to_string(),
        }
    }
}
