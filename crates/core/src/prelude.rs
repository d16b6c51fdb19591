//! Ombaro prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    cart::{
        CartChange, CartItem, CartKey, CartStore, CartTotals, LineItem, MAX_QUANTITY, Unchanged,
    },
    catalog::{
        Catalog, CatalogError, Category, Location, PriceTier, Provider, ProviderCatalog,
        ProviderId, Service, ServiceId,
    },
    checkout::{
        BookingDraft, CheckoutError, CheckoutGate, CheckoutState, CustomerInfo, HomeAddress,
        Readiness, ReadinessCondition, Schedule, ServiceAddress, ServiceType, Submission,
        time_slots,
    },
    ids::{TypedId, TypedUuid},
    orders::{
        CancelledBy, EstimatedArrival, Order, OrderEvent, OrderId, OrderStatus, PaymentMethod,
        PaymentReceipt, ProviderResolution, StatusChange, TransitionError,
    },
    pricing::{PaymentBreakdown, PricingConfig, PricingError},
};
