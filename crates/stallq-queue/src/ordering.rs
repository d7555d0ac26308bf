//! Queue priority ordering.
//!
//! The ETA projector scans rows in this order, so it is the single place that
//! decides who is "ahead" in a stall's prep line.

use std::cmp::Ordering;

use stallq_schemas::{OrderStatus, QueueOrder};

/// 0 = active (pending/accepted), 1 = ready, 2 = cancelled/rejected.
pub fn queue_rank(status: OrderStatus) -> u8 {
    match status {
        OrderStatus::Pending | OrderStatus::Accepted => 0,
        OrderStatus::Ready => 1,
        OrderStatus::Cancelled | OrderStatus::Rejected => 2,
    }
}

fn compare(a: &QueueOrder, b: &QueueOrder) -> Ordering {
    let (ra, rb) = (queue_rank(a.status), queue_rank(b.status));
    ra.cmp(&rb).then_with(|| {
        if ra == 0 {
            // Active orders: first come, first served.
            a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id))
        } else {
            // Resolved orders: most recent first.
            b.id.cmp(&a.id)
        }
    })
}

/// Sort rows into queue order in place.
pub fn queue_order(orders: &mut [QueueOrder]) {
    orders.sort_by(compare);
}
