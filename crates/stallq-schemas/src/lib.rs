use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub type UserId = i64;
pub type StallId = i64;
pub type ProductId = i64;
pub type OrderId = i64;

// ---------------------------------------------------------------------------
// Caller identity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Customer,
    Owner,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Owner => "owner",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "customer" => Ok(Role::Customer),
            "owner" => Ok(Role::Owner),
            other => Err(IdentityError::UnknownRole(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    #[error("user id must be a positive integer, got {0:?}")]
    InvalidUserId(String),
    #[error("unknown role {0:?} (expected customer | owner)")]
    UnknownRole(String),
}

/// Authenticated identity handed to every core entry point by the auth layer.
///
/// The core never authenticates; it trusts this value. Fields are private so
/// that a `Caller` can only exist after [`Caller::new`] validated it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Caller {
    user_id: UserId,
    role: Role,
}

impl Caller {
    pub fn new(user_id: UserId, role: Role) -> Result<Self, IdentityError> {
        if user_id <= 0 {
            return Err(IdentityError::InvalidUserId(user_id.to_string()));
        }
        Ok(Self { user_id, role })
    }

    /// Build from the raw strings forwarded by the auth layer (headers, CLI flags).
    pub fn parse(user_id: &str, role: &str) -> Result<Self, IdentityError> {
        let id: UserId = user_id
            .trim()
            .parse()
            .map_err(|_| IdentityError::InvalidUserId(user_id.to_string()))?;
        Self::new(id, role.parse()?)
    }

    pub fn customer(user_id: UserId) -> Result<Self, IdentityError> {
        Self::new(user_id, Role::Customer)
    }

    pub fn owner(user_id: UserId) -> Result<Self, IdentityError> {
        Self::new(user_id, Role::Owner)
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn role(&self) -> Role {
        self.role
    }
}

// ---------------------------------------------------------------------------
// OrderStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Accepted,
    Rejected,
    Ready,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Accepted,
        OrderStatus::Rejected,
        OrderStatus::Ready,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Accepted => "accepted",
            OrderStatus::Rejected => "rejected",
            OrderStatus::Ready => "ready",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Pending and accepted orders still occupy the stall's prep line.
    pub fn is_active(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::Accepted)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown order status {0:?}")]
pub struct UnknownStatus(pub String);

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|st| st.as_str() == s.trim())
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stall {
    pub id: StallId,
    pub owner_id: UserId,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub stall_id: StallId,
    pub name: String,
    /// Unit price in integer currency units.
    pub price: i64,
    pub prep_minutes: i64,
    pub available_quantity: i64,
    pub is_active: bool,
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRecord {
    pub id: OrderId,
    pub customer_id: UserId,
    pub stall_id: StallId,
    pub token: i64,
    pub price: i64,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: i64,
}

/// One row of an owner queue or customer history, before ETA projection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueOrder {
    pub id: OrderId,
    pub stall_id: StallId,
    pub customer_id: UserId,
    pub token: i64,
    pub status: OrderStatus,
    /// Price committed at placement (Σ unit price × quantity at that time).
    pub total_price: i64,
    /// Σ prep time × quantity over the order's lines; `None` for an order with no lines.
    pub prep_minutes: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub lines: Vec<OrderLine>,
}

/// A queue row annotated with its ETA. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectedOrder {
    #[serde(flatten)]
    pub order: QueueOrder,
    pub remaining_minutes: Option<i64>,
    pub ready_at: Option<DateTime<Utc>>,
}

/// Result of a committed order placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placed {
    pub order_id: OrderId,
    pub stall_id: StallId,
    pub token: i64,
    pub price: i64,
}
