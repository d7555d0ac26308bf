//! ETA projection over a stall's prep line.
//!
//! The stall is modelled as one sequential prep line: every accepted active
//! order pushes back every order behind it by its own prep time. The input
//! must already be in queue order (see [`crate::ordering::queue_order`]).
//!
//! The projection is a display value, recomputed on every read from the
//! caller-supplied `now`. Nothing here is persisted or cached.

use chrono::{DateTime, Duration, Utc};
use stallq_schemas::{OrderStatus, ProjectedOrder, QueueOrder};

/// The fields the projector reads from a queue row.
pub trait QueueEntry {
    fn status(&self) -> OrderStatus;
    /// Total prep minutes for the whole order (Σ prep time × quantity).
    fn prep_minutes(&self) -> Option<i64>;
    fn accepted_at(&self) -> Option<DateTime<Utc>>;
}

impl QueueEntry for QueueOrder {
    fn status(&self) -> OrderStatus {
        self.status
    }

    fn prep_minutes(&self) -> Option<i64> {
        self.prep_minutes
    }

    fn accepted_at(&self) -> Option<DateTime<Utc>> {
        self.accepted_at
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Eta {
    pub remaining_minutes: Option<i64>,
    pub ready_at: Option<DateTime<Utc>>,
}

impl Eta {
    pub const UNKNOWN: Eta = Eta {
        remaining_minutes: None,
        ready_at: None,
    };
}

/// Project one [`Eta`] per entry, in input order.
///
/// The cumulative prep clock is local to this call: two queues never share
/// it, and calling twice with the same input and `now` yields the same output.
pub fn project<E: QueueEntry>(entries: &[E], now: DateTime<Utc>) -> Vec<Eta> {
    // None once the clock has run past what a timestamp can represent; every
    // accepted order from there on is unknown as well.
    let mut cumulative_minutes: Option<i64> = Some(0);

    entries
        .iter()
        .map(|e| {
            if !e.status().is_active() {
                return Eta::UNKNOWN;
            }

            // Not accepted yet: the prep clock has not started for this order,
            // and it does not advance the cumulative clock either.
            let (Some(prep), Some(accepted_at)) = (e.prep_minutes(), e.accepted_at()) else {
                return Eta::UNKNOWN;
            };
            if prep <= 0 {
                return Eta::UNKNOWN;
            }

            cumulative_minutes = cumulative_minutes.and_then(|c| c.checked_add(prep));
            let ready_at = cumulative_minutes
                .and_then(Duration::try_minutes)
                .and_then(|d| accepted_at.checked_add_signed(d));
            let Some(ready_at) = ready_at else {
                cumulative_minutes = None;
                return Eta::UNKNOWN;
            };
            let remaining = (ready_at - now).num_seconds().div_euclid(60).max(0);

            Eta {
                remaining_minutes: Some(remaining),
                ready_at: Some(ready_at),
            }
        })
        .collect()
}

/// Attach projections to owned queue rows for presentation.
pub fn annotate(orders: Vec<QueueOrder>, now: DateTime<Utc>) -> Vec<ProjectedOrder> {
    let etas = project(&orders, now);
    orders
        .into_iter()
        .zip(etas)
        .map(|(order, eta)| ProjectedOrder {
            order,
            remaining_minutes: eta.remaining_minutes,
            ready_at: eta.ready_at,
        })
        .collect()
}
