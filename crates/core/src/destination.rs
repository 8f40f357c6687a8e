//! Shipping Destinations

use serde::{Deserialize, Serialize};

/// Where an order ships to.
///
/// Country and region codes are compared case-insensitively; [`Destination::new`]
/// normalises them to upper case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Destination {
    /// ISO-3166 alpha-2 country code.
    pub country: String,

    /// Optional subdivision (state, province) code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    /// Optional postal code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
}

impl Destination {
    /// Create a normalised destination.
    pub fn new(
        country: impl AsRef<str>,
        region: Option<&str>,
        postal_code: Option<&str>,
    ) -> Self {
        Self {
            country: country.as_ref().trim().to_ascii_uppercase(),
            region: region
                .map(str::trim)
                .filter(|region| !region.is_empty())
                .map(str::to_ascii_uppercase),
            postal_code: postal_code
                .map(str::trim)
                .filter(|code| !code.is_empty())
                .map(ToString::to_string),
        }
    }

    /// A destination identified only by its country.
    pub fn country(country: impl AsRef<str>) -> Self {
        Self::new(country, None, None)
    }

    /// The same destination with codes normalised.
    #[must_use]
    pub fn normalised(&self) -> Self {
        Self::new(
            &self.country,
            self.region.as_deref(),
            self.postal_code.as_deref(),
        )
    }

    /// Region lookup keys from most to least specific: `"US-CA"`, then `"US"`.
    #[must_use]
    pub fn region_keys(&self) -> Vec<String> {
        let normalised = self.normalised();

        let mut keys = Vec::with_capacity(2);

        if let Some(region) = &normalised.region {
            keys.push(format!("{}-{region}", normalised.country));
        }

        keys.push(normalised.country);

        keys
    }
}
