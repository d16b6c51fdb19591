//! Cart
//!
//! The customer's selection of services across providers. Items are keyed by
//! `(service, provider)` and always carry a strictly positive quantity; a
//! quantity that drops to zero removes the item. Every operation is total:
//! invalid keys and catalog misses leave the cart untouched and are reported
//! through [`CartChange`] rather than as errors.

use std::{sync::Arc, time::Duration};

use humanize_duration::{Truncate, prelude::DurationExt};

use crate::catalog::{Provider, ProviderCatalog, ProviderId, Service, ServiceId};

/// Upper bound on the quantity of a single cart item.
pub const MAX_QUANTITY: u32 = 99;

/// Fully qualified cart item key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CartKey {
    /// Service id
    pub service_id: ServiceId,

    /// Provider id
    pub provider_id: ProviderId,
}

impl CartKey {
    /// Create a key from its parts.
    pub fn new(service_id: impl Into<ServiceId>, provider_id: impl Into<ProviderId>) -> Self {
        Self {
            service_id: service_id.into(),
            provider_id: provider_id.into(),
        }
    }
}

/// A quantity of one service from one provider
#[derive(Debug, Clone, PartialEq)]
pub struct CartItem {
    service: Arc<Service>,
    provider: Arc<Provider>,
    quantity: u32,
}

impl CartItem {
    /// The item's key.
    pub fn key(&self) -> CartKey {
        CartKey {
            service_id: self.service.id.clone(),
            provider_id: self.provider.id.clone(),
        }
    }

    /// Whether the item matches `key`.
    pub fn matches(&self, key: &CartKey) -> bool {
        self.service.id == key.service_id && self.provider.id == key.provider_id
    }

    /// Service record
    pub fn service(&self) -> &Arc<Service> {
        &self.service
    }

    /// Provider record
    pub fn provider(&self) -> &Arc<Provider> {
        &self.provider
    }

    /// Quantity, always at least one.
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// `price × quantity`, saturating at `u64::MAX`
    pub fn line_amount(&self) -> u64 {
        self.service.price.saturating_mul(u64::from(self.quantity))
    }

    /// `duration × quantity`, in minutes
    pub fn line_duration(&self) -> u64 {
        u64::from(self.service.duration_minutes).saturating_mul(u64::from(self.quantity))
    }
}

/// Frozen copy of a cart item, as recorded on an order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItem {
    /// Service id
    pub service_id: ServiceId,

    /// Service name at submission time
    pub service_name: String,

    /// Provider id
    pub provider_id: ProviderId,

    /// Provider name at submission time
    pub provider_name: String,

    /// Unit price at submission time
    pub unit_price: u64,

    /// Unit duration in minutes
    pub duration_minutes: u32,

    /// Quantity
    pub quantity: u32,
}

impl LineItem {
    /// `unit_price × quantity`, saturating at `u64::MAX`
    pub fn amount(&self) -> u64 {
        self.unit_price.saturating_mul(u64::from(self.quantity))
    }
}

impl From<&CartItem> for LineItem {
    fn from(item: &CartItem) -> Self {
        LineItem {
            service_id: item.service.id.clone(),
            service_name: item.service.name.clone(),
            provider_id: item.provider.id.clone(),
            provider_name: item.provider.name.clone(),
            unit_price: item.service.price,
            duration_minutes: item.service.duration_minutes,
            quantity: item.quantity,
        }
    }
}

/// Derived cart totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CartTotals {
    /// Σ(price × quantity)
    pub amount: u64,

    /// Σ(duration × quantity), in minutes
    pub duration_minutes: u64,
}

impl CartTotals {
    /// Human readable duration, truncated to whole minutes.
    pub fn duration_label(&self) -> String {
        let duration = Duration::from_secs(self.duration_minutes.saturating_mul(60));

        format!("{}", duration.human(Truncate::Minute))
    }
}

/// Why a cart operation left the cart as it was
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unchanged {
    /// The quantity would exceed [`MAX_QUANTITY`].
    QuantityCap,

    /// No item exists for the key.
    UnknownItem,

    /// The catalog has no such service.
    UnknownService,

    /// The catalog has no such provider.
    UnknownProvider,

    /// The provider does not offer the service.
    NotOffered,
}

/// Outcome of a cart operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartChange {
    /// A new item was inserted with quantity one.
    Added,

    /// An existing item's quantity was raised by one.
    Incremented {
        /// New quantity
        quantity: u32,
    },

    /// An item's quantity was set verbatim.
    QuantitySet {
        /// New quantity
        quantity: u32,
    },

    /// An item was removed.
    Removed,

    /// Nothing changed.
    Unchanged(Unchanged),
}

impl CartChange {
    /// Whether the cart was mutated.
    pub fn is_change(&self) -> bool {
        !matches!(self, CartChange::Unchanged(_))
    }
}

/// Owner of the session's cart
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CartStore {
    items: Vec<CartItem>,
}

impl CartStore {
    /// Create an empty cart.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one unit of `service` from `provider`.
    ///
    /// Increments the existing item for the same key, otherwise appends a new
    /// item with quantity one. Adding beyond [`MAX_QUANTITY`], or a service the
    /// provider does not offer, is a no-op.
    pub fn add_item(&mut self, service: &Arc<Service>, provider: &Arc<Provider>) -> CartChange {
        if !provider.offers(&service.id) {
            return CartChange::Unchanged(Unchanged::NotOffered);
        }

        let existing = self
            .items
            .iter_mut()
            .find(|item| item.service.id == service.id && item.provider.id == provider.id);

        match existing {
            Some(item) if item.quantity >= MAX_QUANTITY => {
                CartChange::Unchanged(Unchanged::QuantityCap)
            }
            Some(item) => {
                item.quantity += 1;

                CartChange::Incremented {
                    quantity: item.quantity,
                }
            }
            None => {
                self.items.push(CartItem {
                    service: Arc::clone(service),
                    provider: Arc::clone(provider),
                    quantity: 1,
                });

                CartChange::Added
            }
        }
    }

    /// Resolve both ids through `catalog` and add one unit.
    ///
    /// A catalog miss on either id is a no-op, so the cart never holds a
    /// dangling reference.
    pub fn add_from_catalog<C>(
        &mut self,
        catalog: &C,
        service_id: &ServiceId,
        provider_id: &ProviderId,
    ) -> CartChange
    where
        C: ProviderCatalog + ?Sized,
    {
        let Some(service) = catalog.service(service_id) else {
            return CartChange::Unchanged(Unchanged::UnknownService);
        };

        let Some(provider) = catalog.provider(provider_id) else {
            return CartChange::Unchanged(Unchanged::UnknownProvider);
        };

        let (service, provider) = (Arc::clone(service), Arc::clone(provider));

        self.add_item(&service, &provider)
    }

    /// Set the quantity for `key` verbatim.
    ///
    /// A quantity of zero or less removes the item. Unknown keys and
    /// quantities above [`MAX_QUANTITY`] are no-ops.
    pub fn update_quantity(&mut self, key: &CartKey, quantity: i64) -> CartChange {
        if quantity <= 0 {
            return self.remove_item(key);
        }

        let Ok(quantity) = u32::try_from(quantity) else {
            return CartChange::Unchanged(Unchanged::QuantityCap);
        };

        if quantity > MAX_QUANTITY {
            return CartChange::Unchanged(Unchanged::QuantityCap);
        }

        match self.items.iter_mut().find(|item| item.matches(key)) {
            Some(item) => {
                item.quantity = quantity;

                CartChange::QuantitySet { quantity }
            }
            None => CartChange::Unchanged(Unchanged::UnknownItem),
        }
    }

    /// Remove the item for `key`, if present.
    pub fn remove_item(&mut self, key: &CartKey) -> CartChange {
        let before = self.items.len();

        self.items.retain(|item| !item.matches(key));

        if self.items.len() == before {
            CartChange::Unchanged(Unchanged::UnknownItem)
        } else {
            CartChange::Removed
        }
    }

    /// Totals derived from the current items.
    ///
    /// Sums saturate at `u64::MAX`; pricing such a total fails with
    /// [`PricingError::Overflow`](crate::pricing::PricingError::Overflow).
    pub fn totals(&self) -> CartTotals {
        self.items
            .iter()
            .fold(CartTotals::default(), |totals, item| CartTotals {
                amount: totals.amount.saturating_add(item.line_amount()),
                duration_minutes: totals
                    .duration_minutes
                    .saturating_add(item.line_duration()),
            })
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Items in insertion order.
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Quantity held for `key`, zero when absent.
    pub fn quantity_of(&self, key: &CartKey) -> u32 {
        self.items
            .iter()
            .find(|item| item.matches(key))
            .map_or(0, CartItem::quantity)
    }

    /// Provider of the first item, used as the venue for spa visits.
    pub fn primary_provider(&self) -> Option<&Arc<Provider>> {
        self.items.first().map(CartItem::provider)
    }

    /// Frozen copy of every item.
    pub fn line_items(&self) -> Vec<LineItem> {
        self.items.iter().map(LineItem::from).collect()
    }

    /// Number of distinct items.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the cart holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use testresult::TestResult;

    use crate::catalog::{Catalog, test_support::catalog};

    use super::*;

    fn lookup(
        catalog: &Catalog,
        service: &str,
        provider: &str,
    ) -> Result<(Arc<Service>, Arc<Provider>), &'static str> {
        let service = catalog
            .service(&ServiceId::new(service))
            .ok_or("service should exist")?;
        let provider = catalog
            .provider(&ProviderId::new(provider))
            .ok_or("provider should exist")?;

        Ok((Arc::clone(service), Arc::clone(provider)))
    }

    fn assert_unique_keys(cart: &CartStore) {
        let keys: HashSet<CartKey> = cart.items().iter().map(CartItem::key).collect();

        assert_eq!(keys.len(), cart.len(), "cart holds duplicate keys");
    }

    fn literal_sum(cart: &CartStore) -> u64 {
        cart.items()
            .iter()
            .map(|item| item.service().price * u64::from(item.quantity()))
            .sum()
    }

    #[test]
    fn adding_new_item_inserts_quantity_one() -> TestResult {
        let catalog = catalog()?;
        let (swedish, serenity) = lookup(&catalog, "swedish", "serenity")?;
        let mut cart = CartStore::new();

        assert_eq!(cart.add_item(&swedish, &serenity), CartChange::Added);
        assert_eq!(cart.quantity_of(&CartKey::new("swedish", "serenity")), 1);

        Ok(())
    }

    #[test]
    fn adding_same_key_increments() -> TestResult {
        let catalog = catalog()?;
        let (swedish, serenity) = lookup(&catalog, "swedish", "serenity")?;
        let mut cart = CartStore::new();

        cart.add_item(&swedish, &serenity);
        let change = cart.add_item(&swedish, &serenity);

        assert_eq!(change, CartChange::Incremented { quantity: 2 });
        assert_eq!(cart.len(), 1);

        Ok(())
    }

    #[test]
    fn same_service_from_two_providers_is_two_items() -> TestResult {
        let catalog = catalog()?;
        let (swedish, serenity) = lookup(&catalog, "swedish", "serenity")?;
        let (_, lotus) = lookup(&catalog, "swedish", "lotus")?;
        let mut cart = CartStore::new();

        cart.add_item(&swedish, &serenity);
        cart.add_item(&swedish, &lotus);

        assert_eq!(cart.len(), 2);
        assert_unique_keys(&cart);

        Ok(())
    }

    #[test]
    fn adding_past_cap_is_a_no_op() -> TestResult {
        let catalog = catalog()?;
        let (swedish, serenity) = lookup(&catalog, "swedish", "serenity")?;
        let key = CartKey::new("swedish", "serenity");
        let mut cart = CartStore::new();

        cart.add_item(&swedish, &serenity);
        cart.update_quantity(&key, i64::from(MAX_QUANTITY));

        let change = cart.add_item(&swedish, &serenity);

        assert_eq!(change, CartChange::Unchanged(Unchanged::QuantityCap));
        assert_eq!(cart.quantity_of(&key), MAX_QUANTITY);

        Ok(())
    }

    #[test]
    fn adding_service_not_offered_is_a_no_op() -> TestResult {
        let catalog = catalog()?;
        let (thai, _) = lookup(&catalog, "thai", "serenity")?;
        let (_, lotus) = lookup(&catalog, "swedish", "lotus")?;
        let mut cart = CartStore::new();

        assert_eq!(
            cart.add_item(&thai, &lotus),
            CartChange::Unchanged(Unchanged::NotOffered)
        );
        assert!(cart.is_empty());

        Ok(())
    }

    #[test]
    fn catalog_misses_are_no_ops() -> TestResult {
        let catalog = catalog()?;
        let mut cart = CartStore::new();

        let unknown_service = cart.add_from_catalog(
            &catalog,
            &ServiceId::new("hot-stone"),
            &ProviderId::new("serenity"),
        );
        let unknown_provider = cart.add_from_catalog(
            &catalog,
            &ServiceId::new("swedish"),
            &ProviderId::new("nowhere"),
        );

        assert_eq!(
            unknown_service,
            CartChange::Unchanged(Unchanged::UnknownService)
        );
        assert_eq!(
            unknown_provider,
            CartChange::Unchanged(Unchanged::UnknownProvider)
        );
        assert!(cart.is_empty());

        Ok(())
    }

    #[test]
    fn update_quantity_sets_verbatim() -> TestResult {
        let catalog = catalog()?;
        let key = CartKey::new("swedish", "serenity");
        let mut cart = CartStore::new();

        cart.add_from_catalog(&catalog, &key.service_id, &key.provider_id);
        cart.add_from_catalog(&catalog, &key.service_id, &key.provider_id);

        assert_eq!(
            cart.update_quantity(&key, 5),
            CartChange::QuantitySet { quantity: 5 }
        );
        assert_eq!(cart.quantity_of(&key), 5);

        Ok(())
    }

    #[test]
    fn update_quantity_zero_removes_and_is_idempotent() -> TestResult {
        let catalog = catalog()?;
        let key = CartKey::new("swedish", "serenity");
        let mut cart = CartStore::new();

        cart.add_from_catalog(&catalog, &key.service_id, &key.provider_id);

        assert_eq!(cart.update_quantity(&key, 0), CartChange::Removed);
        assert_eq!(cart.quantity_of(&key), 0);
        assert!(cart.items().iter().all(|item| !item.matches(&key)));

        assert_eq!(
            cart.update_quantity(&key, 0),
            CartChange::Unchanged(Unchanged::UnknownItem)
        );
        assert!(cart.is_empty());

        Ok(())
    }

    #[test]
    fn update_quantity_only_touches_the_qualified_key() -> TestResult {
        let catalog = catalog()?;
        let serenity = CartKey::new("swedish", "serenity");
        let lotus = CartKey::new("swedish", "lotus");
        let mut cart = CartStore::new();

        cart.add_from_catalog(&catalog, &serenity.service_id, &serenity.provider_id);
        cart.add_from_catalog(&catalog, &lotus.service_id, &lotus.provider_id);

        cart.update_quantity(&serenity, -3);

        assert_eq!(cart.quantity_of(&serenity), 0);
        assert_eq!(cart.quantity_of(&lotus), 1);

        Ok(())
    }

    #[test]
    fn update_quantity_on_missing_key_is_a_no_op() {
        let mut cart = CartStore::new();

        assert_eq!(
            cart.update_quantity(&CartKey::new("swedish", "serenity"), 3),
            CartChange::Unchanged(Unchanged::UnknownItem)
        );
        assert!(cart.is_empty());
    }

    #[test]
    fn update_quantity_above_cap_is_a_no_op() -> TestResult {
        let catalog = catalog()?;
        let key = CartKey::new("thai", "serenity");
        let mut cart = CartStore::new();

        cart.add_from_catalog(&catalog, &key.service_id, &key.provider_id);

        assert_eq!(
            cart.update_quantity(&key, 100),
            CartChange::Unchanged(Unchanged::QuantityCap)
        );
        assert_eq!(
            cart.update_quantity(&key, i64::MAX),
            CartChange::Unchanged(Unchanged::QuantityCap)
        );
        assert_eq!(cart.quantity_of(&key), 1);

        Ok(())
    }

    #[test]
    fn remove_item_is_idempotent() -> TestResult {
        let catalog = catalog()?;
        let key = CartKey::new("thai", "serenity");
        let mut cart = CartStore::new();

        cart.add_from_catalog(&catalog, &key.service_id, &key.provider_id);

        assert_eq!(cart.remove_item(&key), CartChange::Removed);
        assert_eq!(
            cart.remove_item(&key),
            CartChange::Unchanged(Unchanged::UnknownItem)
        );

        Ok(())
    }

    #[test]
    fn totals_sum_price_and_duration_by_quantity() -> TestResult {
        let catalog = catalog()?;
        let mut cart = CartStore::new();
        let swedish = CartKey::new("swedish", "serenity");
        let thai = CartKey::new("thai", "serenity");

        cart.add_from_catalog(&catalog, &swedish.service_id, &swedish.provider_id);
        cart.add_from_catalog(&catalog, &thai.service_id, &thai.provider_id);
        cart.add_from_catalog(&catalog, &thai.service_id, &thai.provider_id);

        let totals = cart.totals();

        assert_eq!(totals.amount, 2000 + 1500 * 2);
        assert_eq!(totals.duration_minutes, 90 + 60 * 2);
        let label = totals.duration_label();
        assert!(
            label.contains("3h") && label.contains("30m"),
            "expected 3h 30m, got {label}"
        );

        Ok(())
    }

    #[test]
    fn mixed_operation_sequence_keeps_invariants() -> TestResult {
        let catalog = catalog()?;
        let keys = [
            CartKey::new("swedish", "serenity"),
            CartKey::new("thai", "serenity"),
            CartKey::new("swedish", "lotus"),
            CartKey::new("thai", "lotus"),
        ];
        let mut cart = CartStore::new();

        for step in 0_i64..200 {
            let key = keys
                .get(usize::try_from(step % 4)?)
                .ok_or("key index in range")?;

            match step % 7 {
                0 | 1 | 2 => {
                    cart.add_from_catalog(&catalog, &key.service_id, &key.provider_id);
                }
                3 => {
                    cart.update_quantity(key, step % 5 - 1);
                }
                4 => {
                    cart.remove_item(key);
                }
                _ => {
                    cart.update_quantity(key, step % 11);
                }
            }

            assert_unique_keys(&cart);
            assert_eq!(cart.totals().amount, literal_sum(&cart));
            assert!(cart.items().iter().all(|item| item.quantity() > 0));
        }

        Ok(())
    }

    #[test]
    fn line_items_are_detached_from_later_mutations() -> TestResult {
        let catalog = catalog()?;
        let key = CartKey::new("swedish", "serenity");
        let mut cart = CartStore::new();

        cart.add_from_catalog(&catalog, &key.service_id, &key.provider_id);

        let snapshot = cart.line_items();
        cart.update_quantity(&key, 4);
        cart.clear();

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.first().map(|item| item.quantity), Some(1));
        assert_eq!(snapshot.first().map(LineItem::amount), Some(2000));

        Ok(())
    }

    #[test]
    fn primary_provider_is_first_item_provider() -> TestResult {
        let catalog = catalog()?;
        let mut cart = CartStore::new();

        assert!(cart.primary_provider().is_none());

        cart.add_from_catalog(&catalog, &ServiceId::new("swedish"), &ProviderId::new("lotus"));
        cart.add_from_catalog(
            &catalog,
            &ServiceId::new("thai"),
            &ProviderId::new("serenity"),
        );

        assert_eq!(
            cart.primary_provider().map(|p| p.id.as_str()),
            Some("lotus")
        );

        Ok(())
    }

    #[test]
    fn duration_labels() {
        let label = |duration_minutes| {
            CartTotals {
                amount: 0,
                duration_minutes,
            }
            .duration_label()
        };

        let short = label(45);
        assert!(
            short.contains("45m") && !short.contains('h'),
            "expected 45m, got {short}"
        );

        let long = label(150);
        assert!(
            long.contains("2h") && long.contains("30m"),
            "expected 2h 30m, got {long}"
        );
    }

    #[test]
    fn oversized_prices_saturate_instead_of_overflowing() -> TestResult {
        let mut catalog = Catalog::new(rusty_money::iso::INR);

        catalog.insert_service(Service {
            id: "private-island".into(),
            name: "Private Island Retreat".to_string(),
            description: "Whole island, one guest".to_string(),
            price: 10_000_000_000_000_000_000,
            duration_minutes: 60,
            category: crate::catalog::Category::Spa,
            rating: 5.0,
        })?;
        catalog.insert_provider(Provider {
            id: "atoll".into(),
            name: "Atoll Resort".to_string(),
            location: crate::catalog::Location {
                latitude: 4.17,
                longitude: 73.5,
                address: "North Malé Atoll".to_string(),
            },
            rating: 5.0,
            review_count: 1,
            distance_km: 900.0,
            is_available: true,
            specialties: std::collections::BTreeSet::new(),
            price_tier: crate::catalog::PriceTier::Premium,
            services: vec!["private-island".into()],
        })?;

        let key = CartKey::new("private-island", "atoll");
        let mut cart = CartStore::new();

        cart.add_from_catalog(&catalog, &key.service_id, &key.provider_id);

        assert_eq!(
            cart.add_from_catalog(&catalog, &key.service_id, &key.provider_id),
            CartChange::Incremented { quantity: 2 }
        );

        let totals = cart.totals();

        assert_eq!(totals.amount, u64::MAX);
        assert_eq!(cart.line_items().first().map(LineItem::amount), Some(u64::MAX));
        assert_eq!(
            crate::pricing::PaymentBreakdown::calculate(
                totals.amount,
                &crate::pricing::PricingConfig::default()
            ),
            Err(crate::pricing::PricingError::Overflow)
        );

        Ok(())
    }
}
