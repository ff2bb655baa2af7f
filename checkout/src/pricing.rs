//! Authoritative pricing for cart snapshots.
//!
//! A single deterministic formula is the sole source of truth for every
//! total shown to the user or sent for payment:
//!
//! ```text
//! subtotal    = Σ (unit_price × quantity)
//! booking_fee = fixed_fee × item_count     (per line item, not per unit)
//! tax         = subtotal × tax_rate
//! total       = subtotal + booking_fee + tax
//! ```
//!
//! No other component derives a total from raw line items. Intermediates
//! keep full decimal precision; currency rounding happens only at
//! presentation and on the final payment amount.

use crate::cart::CartSnapshot;
use crate::config::PricingConfig;
use crate::types::Money;
use serde::Serialize;

/// The priced view of a cart snapshot.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PriceQuote {
    /// Sum of line prices.
    pub subtotal: Money,
    /// Flat fee times the number of line items.
    pub booking_fee: Money,
    /// Tax on the subtotal.
    pub tax: Money,
    /// Grand total: subtotal + fee + tax.
    pub total: Money,
}

impl PriceQuote {
    /// The total as it is sent for payment: currency-rounded.
    #[must_use]
    pub fn payable_total(&self) -> Money {
        self.total.rounded()
    }
}

/// Price a cart snapshot.
///
/// Pure: identical snapshots and configuration always produce identical
/// quotes.
#[must_use]
pub fn price_quote(snapshot: &CartSnapshot, config: &PricingConfig) -> PriceQuote {
    let subtotal = snapshot.subtotal();
    let booking_fee = config.fixed_fee.times(
        u32::try_from(snapshot.item_count()).unwrap_or(u32::MAX),
    );
    let tax = subtotal.scaled_by(config.tax_rate);
    let total = subtotal + booking_fee + tax;

    PriceQuote {
        subtotal,
        booking_fee,
        tax,
        total,
    }
}
