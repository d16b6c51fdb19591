//! Order Lifecycle
//!
//! Owns every placed [`Order`] of a session and drives it through the
//! fulfillment states. Automatic steps are tokio tasks, one per order at most.
//! Each order carries an epoch that is bumped whenever its pending timer is
//! revoked; a timer only applies its event if the epoch it was armed with is
//! still current, so a revoked timer can never mutate the order even if it
//! was already running when it was aborted.

use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
};

use ombaro::{
    checkout::Submission,
    orders::{CancelledBy, Order, OrderEvent, OrderId, PaymentReceipt, ProviderResolution},
};
use rustc_hash::FxHashMap;
use tokio::{runtime::Handle, sync::broadcast, task::JoinHandle};
use tracing::{debug, info, warn};

use crate::{clock::Clock, config::LifecycleConfig};

mod errors;
mod schedule;
mod view;

pub use errors::LifecycleError;
pub use view::{OrderUpdate, OrderView};

const UPDATE_CHANNEL_CAPACITY: usize = 64;

/// What produced an event.
#[derive(Debug, Clone, Copy)]
enum Trigger {
    Timer,
    External,
}

impl Trigger {
    fn as_str(self) -> &'static str {
        match self {
            Trigger::Timer => "timer",
            Trigger::External => "external",
        }
    }
}

#[derive(Debug)]
struct Tracked {
    order: Order,
    attached: bool,
    epoch: u64,
    timer: Option<JoinHandle<()>>,
}

impl Tracked {
    fn revoke(&mut self) {
        self.epoch = self.epoch.wrapping_add(1);

        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }

    fn has_pending_timer(&self) -> bool {
        self.timer.as_ref().is_some_and(|timer| !timer.is_finished())
    }
}

#[derive(Debug, Default)]
struct Registry {
    orders: FxHashMap<OrderId, Tracked>,
    placed: Vec<OrderId>,
}

struct Inner {
    config: LifecycleConfig,
    clock: Arc<dyn Clock>,
    runtime: Handle,
    updates: broadcast::Sender<OrderUpdate>,
    registry: Mutex<Registry>,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, order: &Order) {
        // No subscribers is fine.
        _ = self.updates.send(OrderUpdate::from(order));
    }
}

/// State machine owner for a session's orders
#[derive(Clone)]
pub struct OrderLifecycle {
    inner: Arc<Inner>,
}

impl fmt::Debug for OrderLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderLifecycle")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl OrderLifecycle {
    /// Create a lifecycle with the given timer schedule. Timers run on
    /// `runtime`, so events may be applied from any thread.
    pub fn new(config: LifecycleConfig, clock: Arc<dyn Clock>, runtime: Handle) -> Self {
        let (updates, _) = broadcast::channel(UPDATE_CHANNEL_CAPACITY);

        Self {
            inner: Arc::new(Inner {
                config,
                clock,
                runtime,
                updates,
                registry: Mutex::new(Registry::default()),
            }),
        }
    }

    /// Place an order for a paid submission and arm its first timer.
    pub fn create_order(&self, submission: Submission, receipt: PaymentReceipt) -> OrderView {
        let id = OrderId::now_v7();
        let order = Order::place(id, submission, receipt, self.inner.clock.now());

        info!(
            order = %id,
            total = order.payment().total,
            method = %order.receipt().method,
            items = order.line_items().len(),
            "order placed"
        );

        let mut registry = self.inner.lock();

        registry.placed.push(id);

        let tracked = registry.orders.entry(id).or_insert(Tracked {
            order,
            attached: true,
            epoch: 0,
            timer: None,
        });

        arm(&self.inner, id, tracked);
        self.inner.publish(&tracked.order);

        OrderView::from(&tracked.order)
    }

    /// Apply an externally triggered event.
    ///
    /// # Errors
    ///
    /// - [`LifecycleError::UnknownOrder`]: no such order.
    /// - [`LifecycleError::Transition`]: the event is not legal now; the order
    ///   is unchanged and its pending timer, if any, stays armed.
    pub fn apply(&self, id: OrderId, event: OrderEvent) -> Result<OrderView, LifecycleError> {
        let mut registry = self.inner.lock();

        let tracked = registry
            .orders
            .get_mut(&id)
            .ok_or(LifecycleError::UnknownOrder(id))?;

        apply_event(&self.inner, id, tracked, event, Trigger::External)
    }

    /// The professional started the service.
    ///
    /// # Errors
    ///
    /// See [`OrderLifecycle::apply`].
    pub fn start_service(&self, id: OrderId) -> Result<OrderView, LifecycleError> {
        self.apply(id, OrderEvent::StartService)
    }

    /// The professional finished the service.
    ///
    /// # Errors
    ///
    /// See [`OrderLifecycle::apply`].
    pub fn complete_service(&self, id: OrderId) -> Result<OrderView, LifecycleError> {
        self.apply(id, OrderEvent::CompleteService)
    }

    /// Cancel the order and revoke its pending timer.
    ///
    /// # Errors
    ///
    /// See [`OrderLifecycle::apply`].
    pub fn cancel(&self, id: OrderId, by: CancelledBy) -> Result<OrderView, LifecycleError> {
        self.apply(id, OrderEvent::Cancel(by))
    }

    /// Record a provider cancellation and the customer's chosen resolution.
    ///
    /// # Errors
    ///
    /// See [`OrderLifecycle::apply`].
    pub fn provider_cancelled(
        &self,
        id: OrderId,
        resolution: ProviderResolution,
    ) -> Result<OrderView, LifecycleError> {
        self.apply(id, OrderEvent::ProviderCancelled(resolution))
    }

    /// Replace the arrival estimate of an order that is on its way.
    ///
    /// # Errors
    ///
    /// - [`LifecycleError::UnknownOrder`]: no such order.
    /// - [`LifecycleError::Transition`]: the order is not `EnRoute`.
    pub fn update_eta(&self, id: OrderId, minutes: u32) -> Result<OrderView, LifecycleError> {
        let mut registry = self.inner.lock();

        let tracked = registry
            .orders
            .get_mut(&id)
            .ok_or(LifecycleError::UnknownOrder(id))?;

        tracked
            .order
            .update_eta(minutes)
            .map_err(|source| LifecycleError::Transition { order: id, source })?;

        debug!(order = %id, minutes, "arrival estimate updated");

        self.inner.publish(&tracked.order);

        Ok(OrderView::from(&tracked.order))
    }

    /// Stop driving an order without changing it, e.g. when its view is
    /// closed. Pending timers are revoked; the order keeps its last status.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::UnknownOrder`] for unknown ids.
    pub fn detach(&self, id: OrderId) -> Result<(), LifecycleError> {
        let mut registry = self.inner.lock();

        let tracked = registry
            .orders
            .get_mut(&id)
            .ok_or(LifecycleError::UnknownOrder(id))?;

        tracked.attached = false;
        tracked.revoke();

        debug!(order = %id, status = %tracked.order.status(), "order detached");

        Ok(())
    }

    /// Re-attach to an existing order and re-arm the timer for its current
    /// status. Never creates a new order.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::UnknownOrder`] for unknown ids.
    pub fn resume(&self, id: OrderId) -> Result<OrderView, LifecycleError> {
        let mut registry = self.inner.lock();

        let tracked = registry
            .orders
            .get_mut(&id)
            .ok_or(LifecycleError::UnknownOrder(id))?;

        if !tracked.attached {
            tracked.attached = true;
            arm(&self.inner, id, tracked);

            info!(order = %id, status = %tracked.order.status(), "order resumed");
        }

        Ok(OrderView::from(&tracked.order))
    }

    /// Current snapshot of an order.
    pub fn view(&self, id: OrderId) -> Option<OrderView> {
        self.inner
            .lock()
            .orders
            .get(&id)
            .map(|tracked| OrderView::from(&tracked.order))
    }

    /// Snapshots of every order, oldest first.
    pub fn orders(&self) -> Vec<OrderView> {
        let registry = self.inner.lock();

        registry
            .placed
            .iter()
            .filter_map(|id| registry.orders.get(id))
            .map(|tracked| OrderView::from(&tracked.order))
            .collect()
    }

    /// Whether an automatic step is pending for the order.
    pub fn has_pending_timer(&self, id: OrderId) -> bool {
        self.inner
            .lock()
            .orders
            .get(&id)
            .is_some_and(Tracked::has_pending_timer)
    }

    /// Subscribe to order updates.
    pub fn subscribe(&self) -> broadcast::Receiver<OrderUpdate> {
        self.inner.updates.subscribe()
    }

    /// Detach every order and revoke all pending timers.
    pub fn shutdown(&self) {
        let mut registry = self.inner.lock();

        for tracked in registry.orders.values_mut() {
            tracked.attached = false;
            tracked.revoke();
        }

        debug!(orders = registry.orders.len(), "order lifecycle shut down");
    }
}

fn apply_event(
    inner: &Arc<Inner>,
    id: OrderId,
    tracked: &mut Tracked,
    event: OrderEvent,
    trigger: Trigger,
) -> Result<OrderView, LifecycleError> {
    let from = tracked.order.status();
    let label = event.as_str();

    match tracked.order.apply(event, inner.clock.now()) {
        Ok(status) => {
            info!(
                order = %id,
                %from,
                to = %status,
                event = label,
                trigger = trigger.as_str(),
                "order status changed"
            );

            arm(inner, id, tracked);
            inner.publish(&tracked.order);

            Ok(OrderView::from(&tracked.order))
        }
        Err(source) => {
            warn!(
                order = %id,
                status = %from,
                event = label,
                trigger = trigger.as_str(),
                error = %source,
                "order transition rejected"
            );

            Err(LifecycleError::Transition { order: id, source })
        }
    }
}

/// Revoke the order's pending timer and arm the next automatic step.
fn arm(inner: &Arc<Inner>, id: OrderId, tracked: &mut Tracked) {
    tracked.revoke();

    if !tracked.attached {
        return;
    }

    let Some((delay, event)) = schedule::next_step(&inner.config, tracked.order.status()) else {
        return;
    };

    debug!(order = %id, ?delay, event = event.as_str(), "timer armed");

    let epoch = tracked.epoch;
    let weak = Arc::downgrade(inner);

    tracked.timer = Some(inner.runtime.spawn(async move {
        tokio::time::sleep(delay).await;

        fire(&weak, id, epoch, event);
    }));
}

fn fire(weak: &Weak<Inner>, id: OrderId, epoch: u64, event: OrderEvent) {
    let Some(inner) = weak.upgrade() else {
        return;
    };

    let mut registry = inner.lock();

    let Some(tracked) = registry.orders.get_mut(&id) else {
        return;
    };

    if tracked.epoch != epoch || !tracked.attached {
        debug!(order = %id, event = event.as_str(), "stale timer dropped");
        return;
    }

    // The handle belongs to this task; let it finish on its own.
    tracked.timer = None;

    // A rejection is already logged and leaves the order untouched.
    _ = apply_event(&inner, id, tracked, event, Trigger::Timer);
}
