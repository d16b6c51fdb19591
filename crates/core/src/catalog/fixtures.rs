//! Catalog Fixtures
//!
//! YAML representation of the catalog feed. Prices are written as
//! `"AMOUNT CURRENCY"` (e.g. `"2999 INR"`) and every price in a file must use
//! the same currency.

use std::{collections::BTreeSet, fs, path::Path};

use rusty_money::iso::{self, Currency};
use serde::Deserialize;

use crate::{
    cart::MAX_QUANTITY,
    catalog::{
        Catalog, CatalogError, Category, Location, PriceTier, Provider, ProviderId, Service,
        ServiceId,
    },
};

/// Largest unit price whose line amount at [`MAX_QUANTITY`] still fits in `u64`.
#[expect(clippy::cast_lossless, reason = "u64::from is not const")]
pub const MAX_PRICE: u64 = u64::MAX / MAX_QUANTITY as u64;

/// Top-level catalog document
#[derive(Debug, Deserialize)]
pub struct CatalogFixture {
    /// Service records
    pub services: Vec<ServiceFixture>,

    /// Provider records
    #[serde(default)]
    pub providers: Vec<ProviderFixture>,
}

/// Service Fixture
#[derive(Debug, Deserialize)]
pub struct ServiceFixture {
    /// Service id
    pub id: String,

    /// Display name
    pub name: String,

    /// Description
    #[serde(default)]
    pub description: String,

    /// Price (e.g., "2999 INR")
    pub price: String,

    /// Duration in minutes
    pub duration: u32,

    /// Category
    pub category: Category,

    /// Average rating
    #[serde(default)]
    pub rating: f32,
}

/// Provider Fixture
#[derive(Debug, Deserialize)]
pub struct ProviderFixture {
    /// Provider id
    pub id: String,

    /// Display name
    pub name: String,

    /// Location
    pub location: Location,

    /// Average rating
    #[serde(default)]
    pub rating: f32,

    /// Number of reviews
    #[serde(default)]
    pub reviews: u32,

    /// Distance in kilometres
    #[serde(default)]
    pub distance: f64,

    /// Availability flag
    #[serde(default = "available_by_default")]
    pub available: bool,

    /// Specialties
    #[serde(default)]
    pub specialties: Vec<String>,

    /// Price tier
    pub price_tier: PriceTier,

    /// Offered service ids
    pub services: Vec<String>,
}

fn available_by_default() -> bool {
    true
}

impl Catalog {
    /// Load a catalog from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, if prices are
    /// malformed or mix currencies, or if a provider references a service that
    /// does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let contents = fs::read_to_string(path)?;

        Self::from_yaml_str(&contents)
    }

    /// Build a catalog from a YAML document.
    ///
    /// # Errors
    ///
    /// See [`Catalog::load`].
    pub fn from_yaml_str(contents: &str) -> Result<Self, CatalogError> {
        let fixture: CatalogFixture = serde_norway::from_str(contents)?;

        Self::try_from(fixture)
    }
}

impl TryFrom<CatalogFixture> for Catalog {
    type Error = CatalogError;

    fn try_from(fixture: CatalogFixture) -> Result<Self, Self::Error> {
        let mut currency: Option<&'static Currency> = None;
        let mut services = Vec::with_capacity(fixture.services.len());

        for service_fixture in fixture.services {
            let (price, service_currency) = parse_price(&service_fixture.price)?;

            if price > MAX_PRICE {
                return Err(CatalogError::InvalidPrice(format!(
                    "{} exceeds the largest bookable price {MAX_PRICE}",
                    service_fixture.price
                )));
            }

            match currency {
                Some(existing) if existing != service_currency => {
                    return Err(CatalogError::CurrencyMismatch(
                        existing.iso_alpha_code.to_string(),
                        service_currency.iso_alpha_code.to_string(),
                    ));
                }
                Some(_) => {}
                None => currency = Some(service_currency),
            }

            services.push(Service {
                id: ServiceId::new(service_fixture.id),
                name: service_fixture.name,
                description: service_fixture.description,
                price,
                duration_minutes: service_fixture.duration,
                category: service_fixture.category,
                rating: service_fixture.rating,
            });
        }

        let mut catalog = Catalog::new(currency.unwrap_or(iso::INR));

        for service in services {
            catalog.insert_service(service)?;
        }

        for provider in fixture.providers {
            catalog.insert_provider(provider.into())?;
        }

        Ok(catalog)
    }
}

impl From<ProviderFixture> for Provider {
    fn from(fixture: ProviderFixture) -> Self {
        let mut services: Vec<ServiceId> = Vec::with_capacity(fixture.services.len());

        for id in fixture.services {
            let id = ServiceId::new(id);

            if !services.contains(&id) {
                services.push(id);
            }
        }

        Provider {
            id: ProviderId::new(fixture.id),
            name: fixture.name,
            location: fixture.location,
            rating: fixture.rating,
            review_count: fixture.reviews,
            distance_km: fixture.distance,
            is_available: fixture.available,
            specialties: fixture.specialties.into_iter().collect::<BTreeSet<_>>(),
            price_tier: fixture.price_tier,
            services,
        }
    }
}

/// Parse a price string (e.g., "2999 INR") into whole currency units and currency
///
/// # Errors
///
/// Returns an error if the string is not in the format "AMOUNT CURRENCY", if
/// the amount is not a non-negative whole number, or if the currency code is
/// not recognized.
pub fn parse_price(s: &str) -> Result<(u64, &'static Currency), CatalogError> {
    let mut parts = s.split_whitespace();

    let (Some(amount), Some(code), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(CatalogError::InvalidPrice(format!(
            "expected format 'AMOUNT CURRENCY', got: {s}"
        )));
    };

    let amount = amount
        .parse::<u64>()
        .map_err(|_err| CatalogError::InvalidPrice(s.to_string()))?;

    let currency =
        iso::find(code).ok_or_else(|| CatalogError::UnknownCurrency(code.to_string()))?;

    Ok((amount, currency))
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use crate::catalog::ProviderCatalog;

    use super::*;

    const CATALOG: &str = r"
services:
  - id: swedish
    name: Swedish Massage
    description: Gentle, relaxing massage using long strokes and kneading
    price: 2999 INR
    duration: 60
    category: massage
    rating: 4.8
  - id: glow-facial
    name: Glow Facial
    price: 1799 INR
    duration: 45
    category: facial
providers:
  - id: serenity-spa
    name: Serenity Spa
    location:
      latitude: 12.9716
      longitude: 77.5946
      address: 12 MG Road, Bengaluru
    rating: 4.8
    reviews: 324
    distance: 1.2
    specialties: [Swedish, Aromatherapy]
    price_tier: premium
    services: [swedish, glow-facial, swedish]
";

    #[test]
    fn parses_catalog_document() -> TestResult {
        let catalog = Catalog::from_yaml_str(CATALOG)?;

        assert_eq!(catalog.service_count(), 2);
        assert_eq!(catalog.provider_count(), 1);
        assert_eq!(catalog.currency(), iso::INR);

        let swedish = catalog
            .service(&ServiceId::new("swedish"))
            .ok_or("swedish should exist")?;

        assert_eq!(swedish.price, 2999);
        assert_eq!(swedish.duration_minutes, 60);
        assert_eq!(swedish.category, Category::Massage);

        let provider = catalog
            .provider(&ProviderId::new("serenity-spa"))
            .ok_or("provider should exist")?;

        assert!(provider.is_available, "availability defaults to true");
        assert_eq!(provider.price_tier, PriceTier::Premium);
        assert_eq!(provider.services.len(), 2, "duplicate service ids collapse");
        assert!(provider.specialties.contains("Aromatherapy"));

        Ok(())
    }

    #[test]
    fn body_treatment_category_uses_kebab_case() -> TestResult {
        let yaml = r"
services:
  - id: scrub
    name: Body Scrub
    price: 1200 INR
    duration: 40
    category: body-treatment
";

        let catalog = Catalog::from_yaml_str(yaml)?;
        let scrub = catalog
            .service(&ServiceId::new("scrub"))
            .ok_or("scrub should exist")?;

        assert_eq!(scrub.category, Category::BodyTreatment);

        Ok(())
    }

    #[test]
    fn mixed_currencies_are_rejected() {
        let yaml = r"
services:
  - id: a
    name: A
    price: 100 INR
    duration: 10
    category: spa
  - id: b
    name: B
    price: 100 GBP
    duration: 10
    category: spa
";

        let result = Catalog::from_yaml_str(yaml);

        assert!(
            matches!(result, Err(CatalogError::CurrencyMismatch(ref a, ref b)) if a == "INR" && b == "GBP"),
            "expected CurrencyMismatch, got {result:?}"
        );
    }

    #[test]
    fn provider_referencing_missing_service_is_rejected() {
        let yaml = r"
services: []
providers:
  - id: p
    name: P
    location: { latitude: 0.0, longitude: 0.0, address: nowhere }
    price_tier: budget
    services: [ghost]
";

        let result = Catalog::from_yaml_str(yaml);

        assert!(
            matches!(result, Err(CatalogError::UnknownService { .. })),
            "expected UnknownService, got {result:?}"
        );
    }

    #[test]
    fn parse_price_accepts_whole_units() -> TestResult {
        let (amount, currency) = parse_price("2999 INR")?;

        assert_eq!(amount, 2999);
        assert_eq!(currency, iso::INR);

        Ok(())
    }

    #[test]
    fn parse_price_rejects_malformed_input() {
        assert!(matches!(
            parse_price("2999"),
            Err(CatalogError::InvalidPrice(_))
        ));
        assert!(matches!(
            parse_price("29.99 INR"),
            Err(CatalogError::InvalidPrice(_))
        ));
        assert!(matches!(
            parse_price("2999 INR extra"),
            Err(CatalogError::InvalidPrice(_))
        ));
        assert!(matches!(
            parse_price("2999 XYZ"),
            Err(CatalogError::UnknownCurrency(ref code)) if code == "XYZ"
        ));
    }

    #[test]
    fn parse_price_resolves_any_iso_currency() -> TestResult {
        let (amount, currency) = parse_price("4500 JPY")?;

        assert_eq!(amount, 4500);
        assert_eq!(currency, iso::JPY);

        Ok(())
    }

    #[test]
    fn prices_that_could_overflow_a_cart_line_are_rejected() {
        let yaml = r"
services:
  - id: private-island
    name: Private Island Retreat
    description: Whole island, one guest
    price: 10000000000000000000 INR
    duration: 60
    category: spa
    rating: 5.0
";

        let result = Catalog::from_yaml_str(yaml);

        assert!(
            matches!(result, Err(CatalogError::InvalidPrice(ref message)) if message.contains("10000000000000000000")),
            "expected InvalidPrice, got {result:?}"
        );
    }
}
