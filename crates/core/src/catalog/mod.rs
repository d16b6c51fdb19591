//! Provider Catalog
//!
//! Read-only source of [`Service`] and [`Provider`] records. The catalog is the
//! only producer of these values; everything downstream holds shared
//! references to them and never mutates them.

use std::{collections::BTreeSet, sync::Arc};

use rustc_hash::FxHashMap;
use rusty_money::iso::Currency;
use serde::Deserialize;
use thiserror::Error;

use crate::ids::TypedId;

pub mod fixtures;

/// Service identifier
pub type ServiceId = TypedId<Service>;

/// Provider identifier
pub type ProviderId = TypedId<Provider>;

/// Catalog errors
#[derive(Debug, Error)]
pub enum CatalogError {
    /// IO error reading a catalog file
    #[error("failed to read catalog file: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("failed to parse catalog YAML: {0}")]
    Yaml(#[from] serde_norway::Error),

    /// Invalid price format
    #[error("invalid price format: {0}")]
    InvalidPrice(String),

    /// Unknown currency code
    #[error("unknown currency code: {0}")]
    UnknownCurrency(String),

    /// Prices in one catalog must share a currency
    #[error("currency mismatch: expected {0}, found {1}")]
    CurrencyMismatch(String, String),

    /// A record with the same id was already inserted
    #[error("duplicate catalog id: {0}")]
    DuplicateId(String),

    /// A provider offers a service the catalog does not contain
    #[error("provider {provider} references unknown service {service}")]
    UnknownService {
        /// Offending provider
        provider: String,
        /// Missing service
        service: String,
    },
}

/// Service category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    /// Massage
    Massage,
    /// Spa
    Spa,
    /// Facial
    Facial,
    /// Body treatment
    BodyTreatment,
}

/// Provider price tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PriceTier {
    /// Budget
    Budget,
    /// Mid-range
    Mid,
    /// Premium
    Premium,
}

/// Geographic location of a provider
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Location {
    /// Latitude in degrees
    pub latitude: f64,

    /// Longitude in degrees
    pub longitude: f64,

    /// Street address
    pub address: String,
}

/// Bookable service
#[derive(Debug, Clone, PartialEq)]
pub struct Service {
    /// Service id
    pub id: ServiceId,

    /// Display name
    pub name: String,

    /// Description
    pub description: String,

    /// Unit price in whole currency units
    pub price: u64,

    /// Duration in minutes
    pub duration_minutes: u32,

    /// Category
    pub category: Category,

    /// Average rating
    pub rating: f32,
}

/// Service provider (spa, salon or independent professional)
#[derive(Debug, Clone, PartialEq)]
pub struct Provider {
    /// Provider id
    pub id: ProviderId,

    /// Display name
    pub name: String,

    /// Location
    pub location: Location,

    /// Average rating
    pub rating: f32,

    /// Number of reviews
    pub review_count: u32,

    /// Distance from the customer in kilometres
    pub distance_km: f64,

    /// Whether the provider is currently taking bookings
    pub is_available: bool,

    /// Specialties
    pub specialties: BTreeSet<String>,

    /// Price tier
    pub price_tier: PriceTier,

    /// Offered services, in catalog order
    pub services: Vec<ServiceId>,
}

impl Provider {
    /// Whether this provider offers the given service.
    pub fn offers(&self, service: &ServiceId) -> bool {
        self.services.contains(service)
    }
}

/// Query surface the rest of the system uses to resolve catalog ids.
pub trait ProviderCatalog {
    /// Canonical record for a service id.
    fn service(&self, id: &ServiceId) -> Option<&Arc<Service>>;

    /// Canonical record for a provider id.
    fn provider(&self, id: &ProviderId) -> Option<&Arc<Provider>>;

    /// Services offered by a provider, or `None` for an unknown provider.
    fn services_for(&self, provider: &ProviderId) -> Option<Vec<Arc<Service>>> {
        let provider = self.provider(provider)?;

        Some(
            provider
                .services
                .iter()
                .filter_map(|id| self.service(id).cloned())
                .collect(),
        )
    }
}

/// In-memory catalog
#[derive(Debug, Clone)]
pub struct Catalog {
    currency: &'static Currency,
    services: FxHashMap<ServiceId, Arc<Service>>,
    providers: FxHashMap<ProviderId, Arc<Provider>>,
    provider_order: Vec<ProviderId>,
}

impl Catalog {
    /// Create an empty catalog priced in `currency`.
    pub fn new(currency: &'static Currency) -> Self {
        Self {
            currency,
            services: FxHashMap::default(),
            providers: FxHashMap::default(),
            provider_order: Vec::new(),
        }
    }

    /// Currency all catalog prices are expressed in.
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Insert a service record.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::DuplicateId`] if the id is already present.
    pub fn insert_service(&mut self, service: Service) -> Result<&mut Self, CatalogError> {
        if self.services.contains_key(&service.id) {
            return Err(CatalogError::DuplicateId(service.id.to_string()));
        }

        self.services.insert(service.id.clone(), Arc::new(service));

        Ok(self)
    }

    /// Insert a provider record. Every offered service must already exist.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::DuplicateId`]: the provider id is already present.
    /// - [`CatalogError::UnknownService`]: the provider offers a service that was never inserted.
    pub fn insert_provider(&mut self, provider: Provider) -> Result<&mut Self, CatalogError> {
        if self.providers.contains_key(&provider.id) {
            return Err(CatalogError::DuplicateId(provider.id.to_string()));
        }

        if let Some(missing) = provider
            .services
            .iter()
            .find(|id| !self.services.contains_key(*id))
        {
            return Err(CatalogError::UnknownService {
                provider: provider.id.to_string(),
                service: missing.to_string(),
            });
        }

        self.provider_order.push(provider.id.clone());
        self.providers.insert(provider.id.clone(), Arc::new(provider));

        Ok(self)
    }

    /// Providers in the order they were inserted.
    pub fn providers(&self) -> impl Iterator<Item = &Arc<Provider>> {
        self.provider_order
            .iter()
            .filter_map(|id| self.providers.get(id))
    }

    /// Providers offering the given service.
    pub fn providers_offering<'a>(
        &'a self,
        service: &'a ServiceId,
    ) -> impl Iterator<Item = &'a Arc<Provider>> + 'a {
        self.providers().filter(move |provider| provider.offers(service))
    }

    /// Number of services in the catalog.
    pub fn service_count(&self) -> usize {
        self.services.len()
    }

    /// Number of providers in the catalog.
    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }
}

impl ProviderCatalog for Catalog {
    fn service(&self, id: &ServiceId) -> Option<&Arc<Service>> {
        self.services.get(id)
    }

    fn provider(&self, id: &ProviderId) -> Option<&Arc<Provider>> {
        self.providers.get(id)
    }
}
