//! The consumer side of a mailbox's channel.
//!
//! The producer side lives on [`crate::handle::Handle`] (a `crossbeam_channel::Sender`
//! plus the open flag and capacity policy, all of which must be reachable from any
//! thread holding a handle). `Mailbox` is only ever touched by the single actor
//! thread that owns it, so it carries no lock of its own.

use crossbeam_channel as cb;

use crate::message::Envelope;

pub(crate) struct Mailbox {
    receiver: cb::Receiver<Envelope>,
}

impl Mailbox {
    /// Creates an unbounded channel pair: `(sender, mailbox)`.
    ///
    /// Capacity is enforced at the `Handle` level via `set_capacity`'s policy check
    /// against `Sender::len()`, not by bounding the channel itself; that lets
    /// `set_capacity` be called (or changed) at any point in an actor's life without
    /// needing to reconstruct the channel.
    pub(crate) fn channel() -> (cb::Sender<Envelope>, Mailbox) {
        let (tx, rx) = cb::unbounded();
        (tx, Mailbox { receiver: rx })
    }

    pub(crate) fn receiver(&self) -> &cb::Receiver<Envelope> {
        &self.receiver
    }
}
