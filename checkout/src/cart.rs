//! The cart: ordered prospective bookings with derived totals.
//!
//! The cart is the only mutable shared state in the client, and it is
//! mutated exclusively through [`CartReducer`] — no component reaches
//! into the line-item vector directly. Insertion order is significant:
//! it determines booking-creation order at checkout.
//!
//! Every mutating action re-persists the cart through [`CartStorage`] so
//! a reload does not lose cart contents. Persistence is best-effort: a
//! failed write is logged and the in-memory mutation stands.

use crate::providers::storage::CartStorage;
use crate::types::{CartItemDraft, CartLineItem, Money, ServiceId};
use bookline_core::effect::Effect;
use bookline_core::environment::Clock;
use bookline_core::reducer::Reducer;
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use std::sync::Arc;

/// Cart state: an ordered collection of line items.
///
/// At most one line exists per `service_id`; totals are always derived
/// from the lines, never stored.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CartState {
    items: Vec<CartLineItem>,
}

impl CartState {
    /// The current line items, in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    /// Number of distinct line items (not the sum of quantities).
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Sum of line prices at full precision.
    #[must_use]
    pub fn subtotal(&self) -> Money {
        self.items.iter().map(CartLineItem::price).sum()
    }

    /// `true` when the cart holds no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// An immutable view of the current lines and derived totals.
    ///
    /// Pricing and the checkout coordinator read through snapshots, so a
    /// cart mutation can never be observed mid-read.
    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            items: self.items.clone(),
        }
    }
}

/// An immutable cart view: the unit handed to pricing, checkout, and
/// persistence.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CartSnapshot {
    items: Vec<CartLineItem>,
}

impl CartSnapshot {
    /// Build a snapshot directly from lines (tests, restore paths).
    #[must_use]
    pub fn from_items(items: Vec<CartLineItem>) -> Self {
        Self { items }
    }

    /// The snapshot's line items, in cart order.
    #[must_use]
    pub fn items(&self) -> &[CartLineItem] {
        &self.items
    }

    /// Consume the snapshot, yielding its lines.
    #[must_use]
    pub fn into_items(self) -> Vec<CartLineItem> {
        self.items
    }

    /// Number of distinct line items.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Sum of line prices at full precision.
    #[must_use]
    pub fn subtotal(&self) -> Money {
        self.items.iter().map(CartLineItem::price).sum()
    }

    /// `true` when the snapshot holds no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Cart actions: the defined mutation operations plus restore.
#[derive(Clone, Debug)]
pub enum CartAction {
    /// Insert a line, or overwrite the existing line for the same
    /// service.
    AddItem {
        /// The item as the UI describes it.
        item: CartItemDraft,
    },

    /// Remove the line for `service_id`; a no-op when absent.
    RemoveItem {
        /// The service whose line to drop.
        service_id: ServiceId,
    },

    /// Change a line's quantity. Zero means "not wanted": the line is
    /// removed, exactly as [`CartAction::RemoveItem`] would.
    UpdateQuantity {
        /// The service whose line to update.
        service_id: ServiceId,
        /// The new quantity; `0` removes the line.
        quantity: u32,
    },

    /// Empty the cart.
    ///
    /// Reserved for the checkout composition layer, which issues it only
    /// after payment confirmation; the public UI action surface does not
    /// expose it.
    Clear,

    /// Load the persisted cart from storage.
    Restore,

    /// Feedback: the persisted cart (possibly empty) was loaded.
    Restored {
        /// The lines read from storage.
        items: Vec<CartLineItem>,
    },
}

/// Dependencies of the cart reducer.
#[derive(Clone)]
pub struct CartEnvironment<C, S>
where
    C: Clock,
    S: CartStorage,
{
    /// Clock for `added_at` stamps.
    pub clock: C,
    /// Durable cart storage.
    pub storage: Arc<S>,
}

impl<C, S> CartEnvironment<C, S>
where
    C: Clock,
    S: CartStorage,
{
    /// Create a cart environment.
    #[must_use]
    pub const fn new(clock: C, storage: Arc<S>) -> Self {
        Self { clock, storage }
    }
}

/// The cart reducer.
#[derive(Clone)]
pub struct CartReducer<C, S>
where
    C: Clock,
    S: CartStorage,
{
    _phantom: PhantomData<(C, S)>,
}

impl<C, S> Default for CartReducer<C, S>
where
    C: Clock,
    S: CartStorage,
{
    fn default() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<C, S> CartReducer<C, S>
where
    C: Clock,
    S: CartStorage + 'static,
{
    fn remove(
        state: &mut CartState,
        env: &CartEnvironment<C, S>,
        service_id: &ServiceId,
    ) -> Vec<Effect<CartAction>> {
        let before = state.items.len();
        state.items.retain(|line| line.service_id != *service_id);
        if state.items.len() == before {
            // Absent line: not a mutation, nothing to persist.
            return vec![Effect::None];
        }
        vec![persist(state, env)]
    }
}

impl<C, S> Reducer for CartReducer<C, S>
where
    C: Clock,
    S: CartStorage + 'static,
{
    type State = CartState;
    type Action = CartAction;
    type Environment = CartEnvironment<C, S>;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> Vec<Effect<Self::Action>> {
        match action {
            CartAction::AddItem { item } => {
                match state
                    .items
                    .iter_mut()
                    .find(|line| line.service_id == item.service_id)
                {
                    Some(line) => {
                        // Same service twice: overwrite the existing line
                        // in place. Position and added_at stay put, so
                        // cart order is stable under re-adds.
                        line.service_name = item.service_name;
                        line.unit_price = item.unit_price;
                        line.quantity = item.quantity;
                        line.date = item.date;
                        line.time = item.time;
                        line.special_requests = item.special_requests;
                        line.provider = item.provider;
                    },
                    None => {
                        let line = item.into_line_item(env.clock.now());
                        state.items.push(line);
                    },
                }
                vec![persist(state, env)]
            },

            CartAction::RemoveItem { service_id } => Self::remove(state, env, &service_id),

            CartAction::UpdateQuantity {
                service_id,
                quantity,
            } => {
                if quantity == 0 {
                    // Quantity zero means "not wanted", not "free".
                    return Self::remove(state, env, &service_id);
                }
                match state
                    .items
                    .iter_mut()
                    .find(|line| line.service_id == service_id)
                {
                    Some(line) => {
                        line.quantity = quantity;
                        vec![persist(state, env)]
                    },
                    None => vec![Effect::None],
                }
            },

            CartAction::Clear => {
                state.items.clear();
                vec![persist(state, env)]
            },

            CartAction::Restore => {
                let storage = Arc::clone(&env.storage);
                vec![Effect::future(async move {
                    let items = match storage.load().await {
                        Ok(Some(snapshot)) => snapshot.into_items(),
                        Ok(None) => Vec::new(),
                        Err(error) => {
                            tracing::warn!(%error, "cart restore failed, starting empty");
                            Vec::new()
                        },
                    };
                    Some(CartAction::Restored { items })
                })]
            },

            CartAction::Restored { items } => {
                state.items = items;
                vec![Effect::None]
            },
        }
    }
}

/// Best-effort persistence of the current cart.
fn persist<C, S>(state: &CartState, env: &CartEnvironment<C, S>) -> Effect<CartAction>
where
    C: Clock,
    S: CartStorage + 'static,
{
    let snapshot = state.snapshot();
    let storage = Arc::clone(&env.storage);
    Effect::future(async move {
        if let Err(error) = storage.save(&snapshot).await {
            tracing::warn!(%error, "cart persistence failed");
        }
        None
    })
}
