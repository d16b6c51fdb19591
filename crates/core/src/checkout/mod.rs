//! Checkout
//!
//! [`CheckoutGate`] owns the [`BookingDraft`] for one session and moves it
//! through `Draft → ReadyForPayment → Submitted`. Readiness is derived from
//! the draft on every read, so the gate is `ReadyForPayment` exactly while all
//! conditions hold. Submission is split in two so callers can run the payment
//! in between: [`CheckoutGate::prepare`] produces an immutable [`Submission`]
//! without touching any state, and [`CheckoutGate::complete`] commits it.

use jiff::civil::Date;
use thiserror::Error;

use crate::{
    cart::{CartStore, CartTotals, LineItem},
    catalog::ProviderId,
    pricing::{PaymentBreakdown, PricingConfig, PricingError},
};

pub mod draft;
pub mod readiness;

pub use draft::{BookingDraft, CustomerInfo, HomeAddress, Schedule, ServiceType, time_slots};
pub use readiness::{Readiness, ReadinessCondition};

/// Errors that can occur while submitting a draft.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// One or more readiness conditions do not hold.
    #[error("booking is not ready for payment ({0})")]
    NotReady(Readiness),

    /// There is nothing in the cart to book.
    #[error("cart is empty")]
    EmptyCart,

    /// The draft was already turned into an order.
    #[error("booking was already submitted")]
    AlreadySubmitted,

    /// The payment amount could not be computed.
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

/// Checkout state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutState {
    /// At least one readiness condition fails.
    Draft,

    /// Every readiness condition holds.
    ReadyForPayment,

    /// The draft was turned into an order. Final.
    Submitted,
}

/// Where the service takes place
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceAddress {
    /// The customer's address
    Home(HomeAddress),

    /// The provider's premises
    Provider {
        /// Provider id
        provider_id: ProviderId,

        /// Provider name
        name: String,

        /// Street address
        address: String,
    },
}

impl ServiceAddress {
    /// Single-line rendering.
    pub fn display_line(&self) -> String {
        match self {
            ServiceAddress::Home(address) => {
                let mut parts = vec![address.street.as_str(), address.area.as_str()];

                if let Some(landmark) = address.landmark.as_deref().filter(|l| !l.is_empty()) {
                    parts.push(landmark);
                }

                parts.push(address.city.as_str());

                format!("{} - {}", parts.join(", "), address.pincode)
            }
            ServiceAddress::Provider { name, address, .. } => format!("{name}, {address}"),
        }
    }
}

/// Immutable snapshot of a ready draft and the cart it was built from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    /// Frozen cart contents
    pub line_items: Vec<LineItem>,

    /// Cart totals at submission time
    pub totals: CartTotals,

    /// Service type
    pub service_type: ServiceType,

    /// Appointment date and time
    pub schedule: Schedule,

    /// Contact details
    pub customer: CustomerInfo,

    /// Service address
    pub address: ServiceAddress,

    /// Amount to charge
    pub payment: PaymentBreakdown,
}

/// Gate between a mutable draft and a placed order
#[derive(Debug, Clone, Default)]
pub struct CheckoutGate {
    draft: BookingDraft,
    submitted: bool,
}

impl CheckoutGate {
    /// Start a gate with an empty draft.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current draft.
    pub fn draft(&self) -> &BookingDraft {
        &self.draft
    }

    /// Mutable access to the draft while it has not been submitted.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::AlreadySubmitted`] once the gate is final.
    pub fn draft_mut(&mut self) -> Result<&mut BookingDraft, CheckoutError> {
        if self.submitted {
            return Err(CheckoutError::AlreadySubmitted);
        }

        Ok(&mut self.draft)
    }

    /// Evaluate the readiness predicate against the current draft.
    pub fn readiness(&self, today: Date) -> Readiness {
        Readiness::evaluate(&self.draft, today)
    }

    /// Current state.
    pub fn state(&self, today: Date) -> CheckoutState {
        if self.submitted {
            CheckoutState::Submitted
        } else if self.readiness(today).is_ready() {
            CheckoutState::ReadyForPayment
        } else {
            CheckoutState::Draft
        }
    }

    /// Snapshot the cart and draft into a [`Submission`].
    ///
    /// Nothing is mutated: a failed payment after this call leaves the cart,
    /// the draft and the gate exactly as they were.
    ///
    /// # Errors
    ///
    /// - [`CheckoutError::AlreadySubmitted`]: the gate is final.
    /// - [`CheckoutError::EmptyCart`]: the cart has no items.
    /// - [`CheckoutError::NotReady`]: some readiness condition fails.
    /// - [`CheckoutError::Pricing`]: the payment amount overflowed.
    pub fn prepare(
        &self,
        cart: &CartStore,
        pricing: &PricingConfig,
        today: Date,
    ) -> Result<Submission, CheckoutError> {
        if self.submitted {
            return Err(CheckoutError::AlreadySubmitted);
        }

        if cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let readiness = self.readiness(today);

        let (Some(service_type), Some(schedule), true) = (
            self.draft.service_type,
            self.draft.schedule(),
            readiness.is_ready(),
        ) else {
            return Err(CheckoutError::NotReady(readiness));
        };

        let address = match service_type {
            ServiceType::AtHome => ServiceAddress::Home(self.draft.address.clone()),
            ServiceType::VisitSpa => {
                let provider = cart.primary_provider().ok_or(CheckoutError::EmptyCart)?;

                ServiceAddress::Provider {
                    provider_id: provider.id.clone(),
                    name: provider.name.clone(),
                    address: provider.location.address.clone(),
                }
            }
        };

        let totals = cart.totals();
        let payment = PaymentBreakdown::calculate(totals.amount, pricing)?;

        Ok(Submission {
            line_items: cart.line_items(),
            totals,
            service_type,
            schedule,
            customer: self.draft.customer.clone(),
            address,
            payment,
        })
    }

    /// Commit a submission once its order exists: the gate becomes final and
    /// the cart is emptied.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::AlreadySubmitted`] if called twice.
    pub fn complete(&mut self, cart: &mut CartStore) -> Result<(), CheckoutError> {
        if self.submitted {
            return Err(CheckoutError::AlreadySubmitted);
        }

        self.submitted = true;
        cart.clear();

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use jiff::civil::{date, time};
    use testresult::TestResult;

    use crate::catalog::{ProviderCatalog, ProviderId, ServiceId, test_support};

    use super::*;

    fn today() -> Date {
        date(2026, 10, 19)
    }

    fn filled_cart() -> TestResult<CartStore> {
        let catalog = test_support::catalog()?;
        let mut cart = CartStore::new();

        let swedish = catalog
            .service(&ServiceId::new("swedish"))
            .ok_or("swedish")?;
        let thai = catalog.service(&ServiceId::new("thai")).ok_or("thai")?;
        let serenity = catalog
            .provider(&ProviderId::new("serenity"))
            .ok_or("serenity")?;

        cart.add_item(swedish, serenity);
        cart.add_item(thai, serenity);
        cart.add_item(thai, serenity);

        Ok(cart)
    }

    fn ready_gate(service_type: ServiceType) -> TestResult<CheckoutGate> {
        let mut gate = CheckoutGate::new();
        let draft = gate.draft_mut()?;

        draft.service_type = Some(service_type);
        draft.date = Some(date(2026, 10, 21));
        draft.time = Some(time(14, 0, 0, 0));
        draft.customer = CustomerInfo {
            name: "Ananya Rao".to_string(),
            phone: "+91 98450 12345".to_string(),
        };
        draft.address = HomeAddress {
            street: "14 Residency Road".to_string(),
            area: "Ashok Nagar".to_string(),
            landmark: None,
            city: "Bengaluru".to_string(),
            pincode: "560025".to_string(),
        };
        draft.terms_accepted = true;
        draft.identity_verified = true;

        Ok(gate)
    }

    #[test]
    fn new_gate_is_draft() {
        assert_eq!(CheckoutGate::new().state(today()), CheckoutState::Draft);
    }

    #[test]
    fn gate_becomes_ready_when_conditions_hold() -> TestResult {
        let mut gate = ready_gate(ServiceType::VisitSpa)?;

        assert_eq!(gate.state(today()), CheckoutState::ReadyForPayment);

        gate.draft_mut()?.terms_accepted = false;

        assert_eq!(gate.state(today()), CheckoutState::Draft);

        Ok(())
    }

    #[test]
    fn prepare_snapshots_cart_and_prices_it() -> TestResult {
        let cart = filled_cart()?;
        let gate = ready_gate(ServiceType::AtHome)?;

        let submission = gate.prepare(&cart, &PricingConfig::default(), today())?;

        assert_eq!(submission.totals.amount, 5000);
        assert_eq!(submission.totals.duration_minutes, 210);
        assert_eq!(submission.payment.total, 5959);
        assert_eq!(submission.line_items.len(), 2);
        assert!(matches!(submission.address, ServiceAddress::Home(_)));

        Ok(())
    }

    #[test]
    fn visit_spa_uses_first_provider_address() -> TestResult {
        let cart = filled_cart()?;
        let gate = ready_gate(ServiceType::VisitSpa)?;

        let submission = gate.prepare(&cart, &PricingConfig::default(), today())?;

        assert!(
            matches!(
                submission.address,
                ServiceAddress::Provider { ref provider_id, .. } if provider_id.as_str() == "serenity"
            ),
            "expected provider address, got {:?}",
            submission.address
        );

        Ok(())
    }

    #[test]
    fn prepare_rejects_unready_draft_with_failures() -> TestResult {
        let cart = filled_cart()?;
        let mut gate = ready_gate(ServiceType::VisitSpa)?;

        gate.draft_mut()?.identity_verified = false;

        let result = gate.prepare(&cart, &PricingConfig::default(), today());

        assert!(
            matches!(
                result,
                Err(CheckoutError::NotReady(ref readiness))
                    if readiness.failed() == [ReadinessCondition::IdentityVerified]
            ),
            "expected NotReady, got {result:?}"
        );

        Ok(())
    }

    #[test]
    fn prepare_rejects_empty_cart() -> TestResult {
        let gate = ready_gate(ServiceType::VisitSpa)?;

        let result = gate.prepare(&CartStore::new(), &PricingConfig::default(), today());

        assert!(
            matches!(result, Err(CheckoutError::EmptyCart)),
            "expected EmptyCart, got {result:?}"
        );

        Ok(())
    }

    #[test]
    fn prepare_leaves_cart_untouched() -> TestResult {
        let cart = filled_cart()?;
        let before = cart.clone();
        let gate = ready_gate(ServiceType::AtHome)?;

        gate.prepare(&cart, &PricingConfig::default(), today())?;

        assert_eq!(cart, before);
        assert_eq!(gate.state(today()), CheckoutState::ReadyForPayment);

        Ok(())
    }

    #[test]
    fn complete_is_final_and_clears_cart() -> TestResult {
        let mut cart = filled_cart()?;
        let mut gate = ready_gate(ServiceType::AtHome)?;

        gate.complete(&mut cart)?;

        assert!(cart.is_empty());
        assert_eq!(gate.state(today()), CheckoutState::Submitted);
        assert!(matches!(
            gate.draft_mut(),
            Err(CheckoutError::AlreadySubmitted)
        ));
        assert!(matches!(
            gate.complete(&mut cart),
            Err(CheckoutError::AlreadySubmitted)
        ));

        Ok(())
    }

    #[test]
    fn home_address_line_skips_empty_landmark() {
        let address = ServiceAddress::Home(HomeAddress {
            street: "14 Residency Road".to_string(),
            area: "Ashok Nagar".to_string(),
            landmark: Some(String::new()),
            city: "Bengaluru".to_string(),
            pincode: "560025".to_string(),
        });

        assert_eq!(
            address.display_line(),
            "14 Residency Road, Ashok Nagar, Bengaluru - 560025"
        );
    }
}
