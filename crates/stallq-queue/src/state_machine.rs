//! Order status state machine.
//!
//! # Design
//!
//! Every status change requested for a stall order goes through [`plan`],
//! which is consulted *before* anything is written:
//!
//! 1. **Legal transitions only.** Anything outside the table below returns
//!    [`TransitionError`]; the caller reports it and mutates nothing.
//! 2. **Actor-gated.** Owners drive the prep pipeline; only the customer can
//!    cancel, and only while the order is still pending.
//! 3. **Side effects are declared, not performed.** The returned
//!    [`Transition`] names the [`SideEffect`] the store layer must apply in the
//!    same transaction (stamp `accepted_at`, release reserved inventory).
//!
//! # State diagram
//!
//! ```text
//!              Accept (owner)            MarkReady (owner)
//!   Pending ───────────────────► Accepted ─────────────────► Ready (term.)
//!      │
//!      ├── Reject (owner) ─────► Rejected (term.)
//!      │
//!      └── Cancel (customer) ──► Cancelled (term.)
//! ```

use std::fmt;

use stallq_schemas::{OrderStatus, Role};

// ---------------------------------------------------------------------------
// Actor
// ---------------------------------------------------------------------------

/// Who is asking for the transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Actor {
    Owner,
    Customer,
}

impl From<Role> for Actor {
    fn from(role: Role) -> Self {
        match role {
            Role::Owner => Actor::Owner,
            Role::Customer => Actor::Customer,
        }
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Actor::Owner => f.write_str("owner"),
            Actor::Customer => f.write_str("customer"),
        }
    }
}

// ---------------------------------------------------------------------------
// OrderEvent
// ---------------------------------------------------------------------------

/// Requested lifecycle step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderEvent {
    /// Owner starts preparing the order (→ `Accepted`).
    Accept,
    /// Owner refuses the order (→ `Rejected`).
    Reject,
    /// Owner finished preparing (→ `Ready`).
    MarkReady,
    /// Customer withdraws the order (→ `Cancelled`).
    Cancel,
}

impl OrderEvent {
    /// Status this event moves the order into.
    pub fn target(&self) -> OrderStatus {
        match self {
            OrderEvent::Accept => OrderStatus::Accepted,
            OrderEvent::Reject => OrderStatus::Rejected,
            OrderEvent::MarkReady => OrderStatus::Ready,
            OrderEvent::Cancel => OrderStatus::Cancelled,
        }
    }

    /// Map a requested target status back to its event. `Pending` is never a
    /// valid target.
    pub fn for_target(status: OrderStatus) -> Option<Self> {
        match status {
            OrderStatus::Accepted => Some(OrderEvent::Accept),
            OrderStatus::Rejected => Some(OrderEvent::Reject),
            OrderStatus::Ready => Some(OrderEvent::MarkReady),
            OrderStatus::Cancelled => Some(OrderEvent::Cancel),
            OrderStatus::Pending => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Transition / SideEffect
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideEffect {
    None,
    /// Set `accepted_at = now` (exactly once, never cleared).
    StampAcceptedAt,
    /// Return every order line's quantity to the inventory ledger.
    ReleaseInventory,
}

/// An approved status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: OrderStatus,
    pub to: OrderStatus,
    pub effect: SideEffect,
}

// ---------------------------------------------------------------------------
// TransitionError
// ---------------------------------------------------------------------------

/// Returned when a requested status change is not in the transition table.
///
/// Nothing has been mutated when this is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("illegal order transition: {from} -> {requested} (requested by {actor})")]
pub struct TransitionError {
    pub from: OrderStatus,
    pub requested: OrderStatus,
    pub actor: Actor,
}

// ---------------------------------------------------------------------------
// plan
// ---------------------------------------------------------------------------

/// Decide whether `event`, requested by `actor`, may move an order currently
/// in `from`.
pub fn plan(from: OrderStatus, event: OrderEvent, actor: Actor) -> Result<Transition, TransitionError> {
    use OrderEvent::*;
    use OrderStatus::*;

    let effect = match (from, event, actor) {
        (Pending, Accept, Actor::Owner) => SideEffect::StampAcceptedAt,
        (Pending, Reject, Actor::Owner) => SideEffect::None,
        (Pending, Cancel, Actor::Customer) => SideEffect::ReleaseInventory,
        (Accepted, MarkReady, Actor::Owner) => SideEffect::None,

        // Everything else, including any step out of a terminal status.
        _ => {
            return Err(TransitionError {
                from,
                requested: event.target(),
                actor,
            })
        }
    };

    Ok(Transition {
        from,
        to: event.target(),
        effect,
    })
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
