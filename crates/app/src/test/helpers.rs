//! Test Helpers

use std::sync::Arc;

use jiff::{
    Timestamp,
    civil::{Date, date, time},
};
use ombaro::{
    cart::CartStore,
    catalog::Catalog,
    checkout::{CheckoutGate, CustomerInfo, HomeAddress, ServiceType, Submission},
    orders::{PaymentMethod, PaymentReceipt},
    pricing::PricingConfig,
};

use crate::{
    clock::{Clock, MockClock},
    config::catalog::DEFAULT_CATALOG_PATH,
};

pub(crate) fn today() -> Date {
    date(2026, 10, 19)
}

/// Clock pinned to [`today`] that reports the wall-clock instant.
pub(crate) fn clock() -> Arc<dyn Clock> {
    let mut clock = MockClock::new();

    clock.expect_now().returning(Timestamp::now);
    clock.expect_today().return_const(today());

    Arc::new(clock)
}

pub(crate) fn fixture_catalog() -> Catalog {
    Catalog::load(DEFAULT_CATALOG_PATH).expect("bundled catalog should load")
}

pub(crate) fn rahul() -> CustomerInfo {
    CustomerInfo {
        name: "Rahul Kumar".to_string(),
        phone: "+91 99001 23456".to_string(),
    }
}

pub(crate) fn home_address() -> HomeAddress {
    HomeAddress {
        street: "12 MG Road".to_string(),
        area: "Indiranagar".to_string(),
        landmark: Some("Near Metro Station".to_string()),
        city: "Bengaluru".to_string(),
        pincode: "560038".to_string(),
    }
}

/// A priced submission for one Hot Stone massage at home.
pub(crate) fn at_home_submission() -> Submission {
    let catalog = fixture_catalog();
    let mut cart = CartStore::new();
    cart.add_from_catalog(&catalog, &"hot-stone".into(), &"serenity-spa".into());

    let mut gate = CheckoutGate::new();
    let draft = gate.draft_mut().expect("fresh gate accepts edits");

    draft.service_type = Some(ServiceType::AtHome);
    draft.date = Some(date(2026, 10, 20));
    draft.time = Some(time(16, 30, 0, 0));
    draft.customer = rahul();
    draft.address = home_address();
    draft.terms_accepted = true;
    draft.identity_verified = true;

    gate.prepare(&cart, &PricingConfig::default(), today())
        .expect("draft should be ready")
}

pub(crate) fn receipt() -> PaymentReceipt {
    PaymentReceipt {
        method: PaymentMethod::Card,
        reference: "card_test".to_string(),
    }
}
