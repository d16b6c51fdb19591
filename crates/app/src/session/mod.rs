//! Booking Session
//!
//! One customer's cart, checkout draft and placed orders. The session is the
//! single mutator of its cart and draft: every mutating method takes
//! `&mut self`, so two edits can never interleave.
//!
//! Checkout runs in three steps. The gate first snapshots the cart and draft
//! into a [`Submission`](ombaro::checkout::Submission) without mutating
//! anything. The payment processor then charges the total. Only after a
//! captured payment is the order placed, the gate finalised and the cart
//! cleared. A failed, declined, pending or dropped payment leaves the session
//! exactly as it was.

use std::{fmt, sync::Arc};

use jiff::civil::{Date, Time};
use ombaro::{
    cart::{CartChange, CartKey, CartStore, CartTotals},
    catalog::{Catalog, ProviderCatalog, ProviderId, ServiceId},
    checkout::{
        BookingDraft, CheckoutGate, CheckoutState, CustomerInfo, HomeAddress, Readiness,
        ServiceType,
    },
    ids::TypedUuid,
    orders::{CancelledBy, OrderId, PaymentMethod, PaymentReceipt, ProviderResolution},
    pricing::{PaymentBreakdown, PricingConfig},
};
use rusty_money::iso::Currency;
use tracing::{debug, info, warn};

use crate::{
    clock::Clock,
    context::AppContext,
    identity::{IdentityVerifier, Verification, VerificationRequest},
    lifecycle::{OrderLifecycle, OrderView},
    payments::{PaymentOutcome, PaymentProcessor, PaymentRequest},
};

mod errors;

pub use errors::SessionError;

/// Session identifier
pub type SessionId = TypedUuid<BookingSession>;

/// A customer's booking session
pub struct BookingSession {
    id: SessionId,
    catalog: Arc<Catalog>,
    pricing: PricingConfig,
    currency: &'static Currency,
    cart: CartStore,
    gate: CheckoutGate,
    identity: Arc<dyn IdentityVerifier>,
    payments: Arc<dyn PaymentProcessor>,
    lifecycle: OrderLifecycle,
    clock: Arc<dyn Clock>,
    active_order: Option<OrderId>,
}

impl fmt::Debug for BookingSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BookingSession")
            .field("id", &self.id)
            .field("cart", &self.cart)
            .field("gate", &self.gate)
            .field("active_order", &self.active_order)
            .finish_non_exhaustive()
    }
}

impl BookingSession {
    /// Start a session with an empty cart and draft.
    pub fn new(ctx: &AppContext) -> Self {
        let id = SessionId::now_v7();

        debug!(session = %id, "booking session started");

        Self {
            id,
            catalog: Arc::clone(&ctx.catalog),
            pricing: ctx.pricing,
            currency: ctx.currency,
            cart: CartStore::new(),
            gate: CheckoutGate::new(),
            identity: Arc::clone(&ctx.identity),
            payments: Arc::clone(&ctx.payments),
            lifecycle: ctx.lifecycle.clone(),
            clock: Arc::clone(&ctx.clock),
            active_order: None,
        }
    }

    /// Session id
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Catalog the session books from.
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Add one unit of a service from a provider.
    pub fn add_to_cart(&mut self, service: &ServiceId, provider: &ProviderId) -> CartChange {
        let change = self
            .cart
            .add_from_catalog(self.catalog.as_ref(), service, provider);

        debug!(
            session = %self.id,
            %service,
            %provider,
            ?change,
            items = self.cart.len(),
            "cart add"
        );

        change
    }

    /// Set the quantity of a cart item; zero or less removes it.
    pub fn update_quantity(&mut self, key: &CartKey, quantity: i64) -> CartChange {
        let change = self.cart.update_quantity(key, quantity);

        debug!(
            session = %self.id,
            service = %key.service_id,
            provider = %key.provider_id,
            quantity,
            ?change,
            "cart quantity"
        );

        change
    }

    /// Remove a cart item.
    pub fn remove_from_cart(&mut self, key: &CartKey) -> CartChange {
        let change = self.cart.remove_item(key);

        debug!(
            session = %self.id,
            service = %key.service_id,
            provider = %key.provider_id,
            ?change,
            "cart remove"
        );

        change
    }

    /// Current cart.
    pub fn cart(&self) -> &CartStore {
        &self.cart
    }

    /// Current cart totals.
    pub fn totals(&self) -> CartTotals {
        self.cart.totals()
    }

    /// Current draft.
    pub fn draft(&self) -> &BookingDraft {
        self.gate.draft()
    }

    /// Choose at-home or visit-spa service.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Checkout`] once the draft was submitted.
    pub fn set_service_type(&mut self, service_type: ServiceType) -> Result<Readiness, SessionError> {
        self.edit_draft(|draft| draft.service_type = Some(service_type))
    }

    /// Choose the appointment date and time.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Checkout`] once the draft was submitted.
    pub fn set_schedule(&mut self, date: Date, time: Time) -> Result<Readiness, SessionError> {
        self.edit_draft(|draft| {
            draft.date = Some(date);
            draft.time = Some(time);
        })
    }

    /// Set the customer's contact details. Changing them invalidates an
    /// earlier identity verification.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Checkout`] once the draft was submitted.
    pub fn set_customer(&mut self, customer: CustomerInfo) -> Result<Readiness, SessionError> {
        self.edit_draft(|draft| {
            if draft.customer != customer {
                draft.identity_verified = false;
                draft.customer = customer;
            }
        })
    }

    /// Set the home address used for at-home service.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Checkout`] once the draft was submitted.
    pub fn set_address(&mut self, address: HomeAddress) -> Result<Readiness, SessionError> {
        self.edit_draft(|draft| draft.address = address)
    }

    /// Accept or withdraw acceptance of the terms.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Checkout`] once the draft was submitted.
    pub fn accept_terms(&mut self, accepted: bool) -> Result<Readiness, SessionError> {
        self.edit_draft(|draft| draft.terms_accepted = accepted)
    }

    fn edit_draft(
        &mut self,
        edit: impl FnOnce(&mut BookingDraft),
    ) -> Result<Readiness, SessionError> {
        edit(self.gate.draft_mut()?);

        let readiness = self.readiness();

        debug!(session = %self.id, %readiness, "draft updated");

        Ok(readiness)
    }

    /// Ask the identity service to verify the customer and record the result.
    ///
    /// # Errors
    ///
    /// - [`SessionError::Checkout`]: the draft was already submitted.
    /// - [`SessionError::Identity`]: the service failed; the draft keeps its
    ///   previous verification state.
    pub async fn verify_identity(&mut self) -> Result<Verification, SessionError> {
        let customer = self.gate.draft_mut()?.customer.clone();

        let request = VerificationRequest {
            session: self.id,
            name: customer.name,
            phone: customer.phone,
        };

        let outcome = match self.identity.verify(request).await {
            Ok(outcome) => outcome,
            Err(error) => {
                warn!(session = %self.id, %error, "identity verification failed");
                return Err(error.into());
            }
        };

        info!(session = %self.id, ?outcome, "identity verification finished");

        self.gate.draft_mut()?.identity_verified = outcome.is_verified();

        Ok(outcome)
    }

    /// Readiness of the draft as of today.
    pub fn readiness(&self) -> Readiness {
        self.gate.readiness(self.clock.today())
    }

    /// Checkout state as of today.
    pub fn state(&self) -> CheckoutState {
        self.gate.state(self.clock.today())
    }

    /// Amount that would be charged for the current cart.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Pricing`] if the amount overflows.
    pub fn payment_preview(&self) -> Result<PaymentBreakdown, SessionError> {
        Ok(PaymentBreakdown::calculate(
            self.cart.totals().amount,
            &self.pricing,
        )?)
    }

    /// Charge the customer and place the order.
    ///
    /// The session is only mutated once the payment was captured. Dropping
    /// the returned future before it completes leaves the session unchanged.
    ///
    /// # Errors
    ///
    /// - [`SessionError::Checkout`]: empty cart, unmet readiness conditions or
    ///   a draft that was already submitted.
    /// - [`SessionError::Payment`], [`SessionError::PaymentDeclined`],
    ///   [`SessionError::PaymentPending`]: the charge did not go through; the
    ///   request may be retried.
    pub async fn proceed(&mut self, method: PaymentMethod) -> Result<OrderView, SessionError> {
        let submission = self
            .gate
            .prepare(&self.cart, &self.pricing, self.clock.today())?;

        let request = PaymentRequest {
            session: self.id,
            amount: submission.payment.total,
            currency: self.currency.iso_alpha_code,
            method,
        };

        info!(
            session = %self.id,
            amount = request.amount,
            currency = request.currency,
            %method,
            "charging customer"
        );

        let reference = match self.payments.charge(request).await {
            Ok(PaymentOutcome::Succeeded { reference }) => reference,
            Ok(PaymentOutcome::Declined { reason }) => {
                warn!(session = %self.id, %method, %reason, "payment declined");
                return Err(SessionError::PaymentDeclined(reason));
            }
            Ok(PaymentOutcome::Pending) => {
                warn!(session = %self.id, %method, "payment pending");
                return Err(SessionError::PaymentPending);
            }
            Err(error) => {
                warn!(session = %self.id, %method, %error, "payment failed");
                return Err(error.into());
            }
        };

        let order = self
            .lifecycle
            .create_order(submission, PaymentReceipt { method, reference });

        self.gate.complete(&mut self.cart)?;
        self.active_order = Some(order.id);

        Ok(order)
    }

    /// Snapshot of the order placed by this session, if any.
    pub fn active_order(&self) -> Option<OrderView> {
        self.active_order.and_then(|id| self.lifecycle.view(id))
    }

    /// Id of the order placed by this session, if any.
    pub fn active_order_id(&self) -> Option<OrderId> {
        self.active_order
    }

    /// Cancel the active order on the customer's behalf.
    ///
    /// # Errors
    ///
    /// - [`SessionError::NoActiveOrder`]: nothing was placed.
    /// - [`SessionError::Lifecycle`]: the order can no longer be cancelled.
    pub fn cancel_order(&self) -> Result<OrderView, SessionError> {
        let id = self.active_order.ok_or(SessionError::NoActiveOrder)?;

        Ok(self.lifecycle.cancel(id, CancelledBy::Customer)?)
    }

    /// Record that the provider withdrew from the active order, continuing with
    /// the customer's chosen resolution. A replacement provider must be listed
    /// in the catalog and available.
    ///
    /// # Errors
    ///
    /// - [`SessionError::NoActiveOrder`]: nothing was placed.
    /// - [`SessionError::UnknownProvider`]: the replacement is not in the catalog.
    /// - [`SessionError::ProviderUnavailable`]: the replacement is not taking bookings.
    /// - [`SessionError::Lifecycle`]: the order is already finished.
    pub fn provider_cancelled(
        &self,
        resolution: ProviderResolution,
    ) -> Result<OrderView, SessionError> {
        let id = self.active_order.ok_or(SessionError::NoActiveOrder)?;

        if let ProviderResolution::Reassign(provider_id) = &resolution {
            let provider = self
                .catalog
                .provider(provider_id)
                .ok_or_else(|| SessionError::UnknownProvider(provider_id.clone()))?;

            if !provider.is_available {
                return Err(SessionError::ProviderUnavailable(provider_id.clone()));
            }
        }

        Ok(self.lifecycle.provider_cancelled(id, resolution)?)
    }

    /// Stop following the active order; it keeps its last status.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NoActiveOrder`] when nothing was placed.
    pub fn detach_order(&self) -> Result<(), SessionError> {
        let id = self.active_order.ok_or(SessionError::NoActiveOrder)?;

        Ok(self.lifecycle.detach(id)?)
    }

    /// Follow the active order again, resuming its timers.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NoActiveOrder`] when nothing was placed.
    pub fn resume_order(&self) -> Result<OrderView, SessionError> {
        let id = self.active_order.ok_or(SessionError::NoActiveOrder)?;

        Ok(self.lifecycle.resume(id)?)
    }

    /// Start over with an empty cart and draft. Placed orders are unaffected.
    pub fn new_booking(&mut self) {
        self.cart.clear();
        self.gate = CheckoutGate::new();

        debug!(session = %self.id, "new booking started");
    }
}
