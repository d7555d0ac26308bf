//! Pure order-lifecycle domain: the status state machine, queue ordering and
//! the ETA projector. No I/O lives in this crate.

pub mod eta;
pub mod ordering;
pub mod state_machine;

pub use eta::{annotate, project, Eta, QueueEntry};
pub use ordering::{queue_order, queue_rank};
pub use state_machine::{plan, Actor, OrderEvent, SideEffect, Transition, TransitionError};
