//! Core domain types for the cart and checkout pipeline.
//!
//! Money is a thin wrapper over [`rust_decimal::Decimal`]: line and cart
//! totals are computed at full precision, and currency rounding (2 decimal
//! places, banker's rounding) is applied only at presentation and at the
//! final amount sent for payment.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign};

/// Unique identifier for a bookable service.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceId(String);

impl ServiceId {
    /// Creates a new `ServiceId` from a string.
    #[must_use]
    pub const fn new(id: String) -> Self {
        Self(id)
    }

    /// Returns the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ServiceId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Identifier of the party offering a service.
///
/// Opaque to this subsystem; it is carried from the catalog into the
/// booking request unchanged.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProviderId(String);

impl ProviderId {
    /// Creates a new `ProviderId` from a string.
    #[must_use]
    pub const fn new(id: String) -> Self {
        Self(id)
    }

    /// Returns the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ProviderId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Identifier of a booking created by the booking service.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookingId(String);

impl BookingId {
    /// Creates a new `BookingId` from a string.
    #[must_use]
    pub const fn new(id: String) -> Self {
        Self(id)
    }

    /// Returns the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BookingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a payment intent held by the payment service.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PaymentIntentId(String);

impl PaymentIntentId {
    /// Creates a new `PaymentIntentId` from a string.
    #[must_use]
    pub const fn new(id: String) -> Self {
        Self(id)
    }

    /// Returns the inner string value.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PaymentIntentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// ISO-style currency code, lowercase (e.g. `"usd"`).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency(String);

impl Currency {
    /// Creates a currency from a code, normalised to lowercase.
    #[must_use]
    pub fn new(code: &str) -> Self {
        Self(code.to_lowercase())
    }

    /// Returns the currency code.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Currency {
    fn default() -> Self {
        Self("usd".to_string())
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A decimal money amount, currency-agnostic at this layer.
///
/// Arithmetic keeps full precision; call [`Money::rounded`] exactly where
/// a currency amount leaves the system (display, payment request).
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Zero.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Creates a money amount from a raw decimal.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Creates a money amount from whole currency units.
    #[must_use]
    pub fn from_major(units: i64) -> Self {
        Self(Decimal::from(units))
    }

    /// Creates a money amount from an unscaled value and a scale.
    ///
    /// `Money::with_scale(1050, 2)` is 10.50.
    #[must_use]
    pub fn with_scale(num: i64, scale: u32) -> Self {
        Self(Decimal::new(num, scale))
    }

    /// The underlying decimal at full precision.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Currency-rounded value: 2 decimal places, round-half-even.
    ///
    /// Applied only at presentation and at the final amount sent for
    /// payment; intermediate sums stay at full precision so rounding
    /// error cannot compound across line items.
    #[must_use]
    pub fn rounded(&self) -> Self {
        Self(
            self.0
                .round_dp_with_strategy(2, RoundingStrategy::MidpointNearestEven),
        )
    }

    /// Multiply by a unitless quantity (duration units).
    #[must_use]
    pub fn times(&self, quantity: u32) -> Self {
        Self(self.0 * Decimal::from(quantity))
    }

    /// Multiply by a decimal rate (e.g. a tax rate).
    #[must_use]
    pub fn scaled_by(&self, rate: Decimal) -> Self {
        Self(self.0 * rate)
    }

    /// `true` for amounts strictly greater than zero.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// `true` for amounts strictly less than zero.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.rounded().0)
    }
}

/// One prospective booking held client-side before checkout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CartLineItem {
    /// Service being booked; unique within the cart.
    pub service_id: ServiceId,
    /// Display name of the service.
    pub service_name: String,
    /// Price per duration unit.
    pub unit_price: Money,
    /// Duration units booked; always positive.
    pub quantity: u32,
    /// Requested calendar date, if chosen.
    pub date: Option<NaiveDate>,
    /// Requested time of day, as the catalog presents it (e.g. "14:30").
    pub time: Option<String>,
    /// Free-text requests forwarded to the provider.
    pub special_requests: Option<String>,
    /// The offering party.
    pub provider: ProviderId,
    /// When the line was first added to the cart.
    pub added_at: DateTime<Utc>,
}

impl CartLineItem {
    /// The line's contribution to the subtotal: `unit_price × quantity`.
    ///
    /// Always derived, never stored, so it cannot drift from its inputs.
    #[must_use]
    pub fn price(&self) -> Money {
        self.unit_price.times(self.quantity)
    }
}

/// The data a UI supplies when adding a service to the cart.
///
/// The cart reducer stamps `added_at` and enforces the one-line-per-service
/// invariant; quantity normalisation (zero is meaningless on an add)
/// happens here, on the caller's side of the contract.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CartItemDraft {
    /// Service being booked.
    pub service_id: ServiceId,
    /// Display name of the service.
    pub service_name: String,
    /// Price per duration unit.
    pub unit_price: Money,
    /// Duration units requested.
    pub quantity: u32,
    /// Requested calendar date.
    pub date: Option<NaiveDate>,
    /// Requested time of day.
    pub time: Option<String>,
    /// Free-text requests forwarded to the provider.
    pub special_requests: Option<String>,
    /// The offering party.
    pub provider: ProviderId,
}

impl CartItemDraft {
    /// Creates a draft with quantity 1 and no schedule.
    #[must_use]
    pub fn new(
        service_id: ServiceId,
        service_name: String,
        unit_price: Money,
        provider: ProviderId,
    ) -> Self {
        Self {
            service_id,
            service_name,
            unit_price,
            quantity: 1,
            date: None,
            time: None,
            special_requests: None,
            provider,
        }
    }

    /// Sets the quantity, clamping zero up to 1.
    #[must_use]
    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.quantity = quantity.max(1);
        self
    }

    /// Sets the requested date and time.
    #[must_use]
    pub fn with_schedule(mut self, date: NaiveDate, time: String) -> Self {
        self.date = Some(date);
        self.time = Some(time);
        self
    }

    /// Sets the special requests text.
    #[must_use]
    pub fn with_special_requests(mut self, requests: String) -> Self {
        self.special_requests = Some(requests);
        self
    }

    /// Promote the draft to a cart line stamped with `added_at`.
    #[must_use]
    pub fn into_line_item(self, added_at: DateTime<Utc>) -> CartLineItem {
        CartLineItem {
            service_id: self.service_id,
            service_name: self.service_name,
            unit_price: self.unit_price,
            quantity: self.quantity,
            date: self.date,
            time: self.time,
            special_requests: self.special_requests,
            provider: self.provider,
            added_at,
        }
    }
}

/// Contact and location details collected during checkout.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    /// Customer name.
    pub name: String,
    /// Customer email address.
    pub email: String,
    /// Customer phone number.
    pub phone: String,
    /// Service location (address), when the booking happens off-site.
    pub location: Option<String>,
}

/// An opaque client-side payment credential (e.g. a tokenized card).
///
/// Never logged; the `Debug` impl redacts the value.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentCredentials(String);

impl PaymentCredentials {
    /// Wraps a credential token.
    #[must_use]
    pub const fn new(token: String) -> Self {
        Self(token)
    }

    /// Returns the raw token for submission to the payment service.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PaymentCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PaymentCredentials(<redacted>)")
    }
}
