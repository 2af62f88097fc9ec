//! The error taxonomy surfaced by `receive`/`receive_timeout`/`receive_only`/`send`.

use thiserror::Error;

use crate::handle::Handle;

/// Errors raised from inside a `receive` call, or from `send` under capacity policy
/// `Fail`.
///
/// An unhandled `ActorError` propagating out of an actor body unwinds that body,
/// which triggers teardown and notifies the actor's owner and links; this is the
/// supervision channel, not a side effect to suppress.
#[derive(Debug, Error)]
pub enum ActorError {
    /// `receive_only` fell through to its wildcard fallback: the next message did
    /// not satisfy the expected shape.
    #[error("message did not match the expected shape")]
    MessageMismatch,

    /// Surfaced on the next blocking receive after this actor's owner exited. After
    /// this fires once, the owner is cleared and it will not fire again.
    #[error("owner {who} terminated")]
    OwnerTerminated {
        /// The owner that terminated.
        who: Handle,
    },

    /// Raised synchronously during the receive call that observed the death of a
    /// bidirectionally linked peer. `who` has already been removed from this
    /// actor's links by the time the error is returned.
    #[error("linked actor {who} terminated")]
    LinkTerminated {
        /// The linked peer that terminated.
        who: Handle,
    },

    /// A `send` under capacity policy `Fail` found the destination mailbox at or
    /// over its configured limit.
    #[error("destination mailbox is full")]
    SendFull,
}
