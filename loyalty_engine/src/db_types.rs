use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

pub use lpg_common::Cents;

use crate::helpers::is_valid_order_number;

//--------------------------------------     OrderNumber       ---------------------------------------------------------
/// An externally assigned order identifier. Order numbers are opaque numeric strings protected by a Luhn check digit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderNumber(String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{0}' is not a valid order number")]
pub struct InvalidOrderNumber(pub String);

impl OrderNumber {
    /// Wraps the given string without validating it. Use [`OrderNumber::validated`] for untrusted input.
    pub fn new<S: Into<String>>(value: S) -> Self {
        Self(value.into())
    }

    /// Returns the order number if it consists only of digits and passes the Luhn check.
    pub fn validated(value: &str) -> Result<Self, InvalidOrderNumber> {
        if is_valid_order_number(value) {
            Ok(Self(value.to_string()))
        } else {
            Err(InvalidOrderNumber(value.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for OrderNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for OrderNumber {
    type Err = InvalidOrderNumber;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::validated(s)
    }
}

//--------------------------------------   OrderStatusType     ---------------------------------------------------------
/// The reconciliation state of an order.
///
/// `New` → `Processing` → `Invalid` | `Processed`. The last two are terminal and absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatusType {
    /// The order has been accepted but the worker has not started on it yet.
    New,
    /// The worker is polling the accrual service for this order.
    Processing,
    /// The accrual service rejected the order. No points are credited.
    Invalid,
    /// The accrual has been credited to the owner's balance.
    Processed,
}

impl OrderStatusType {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Invalid | Self::Processed)
    }

    /// `true` if an order in this state may be moved to `next`. Re-writing `Processing` is allowed.
    pub fn can_transition_to(&self, next: OrderStatusType) -> bool {
        use OrderStatusType::*;
        matches!((self, next), (New, Processing) | (Processing, Processing) | (Processing, Invalid) | (Processing, Processed))
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::New => write!(f, "NEW"),
            OrderStatusType::Processing => write!(f, "PROCESSING"),
            OrderStatusType::Invalid => write!(f, "INVALID"),
            OrderStatusType::Processed => write!(f, "PROCESSED"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid order status: {0}")]
pub struct OrderStatusConversionError(String);

impl FromStr for OrderStatusType {
    type Err = OrderStatusConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NEW" => Ok(Self::New),
            "PROCESSING" => Ok(Self::Processing),
            "INVALID" => Ok(Self::Invalid),
            "PROCESSED" => Ok(Self::Processed),
            s => Err(OrderStatusConversionError(s.to_string())),
        }
    }
}

//--------------------------------------        Order          ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub order_number: OrderNumber,
    pub user_id: i64,
    pub status: OrderStatusType,
    pub accrual: Cents,
    pub uploaded_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn is_owned_by(&self, user_id: i64) -> bool {
        self.user_id == user_id
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub order_number: OrderNumber,
    pub user_id: i64,
}

impl NewOrder {
    pub fn new(order_number: OrderNumber, user_id: i64) -> Self {
        Self { order_number, user_id }
    }
}

//--------------------------------------     UserAccount       ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: i64,
    pub login: String,
    pub balance: Cents,
    /// Managed by the authentication service. Never exposed over the API.
    #[serde(skip)]
    pub credential_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------      Withdrawal       ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, PartialEq, Eq, Serialize, Deserialize)]
pub struct Withdrawal {
    pub id: i64,
    pub order_number: OrderNumber,
    pub user_id: i64,
    pub sum: Cents,
    pub processed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWithdrawal {
    pub order_number: OrderNumber,
    pub user_id: i64,
    pub sum: Cents,
}

impl NewWithdrawal {
    pub fn new(order_number: OrderNumber, user_id: i64, sum: Cents) -> Self {
        Self { order_number, user_id, sum }
    }
}
