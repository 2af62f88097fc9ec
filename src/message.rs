//! The envelope carried through a mailbox's channel: either a user payload or an
//! internal control signal.

use crate::dynamic::DynValue;
use crate::handle::Handle;

/// Internal control signals. Currently only the termination notification.
#[derive(Debug, Clone)]
pub(crate) enum Control {
    /// `who` has torn down; delivered to its owner and/or links.
    LinkDead(Handle),
}

/// A single queued item: either a user-sent payload or a control signal.
pub(crate) enum Envelope {
    User(DynValue),
    Control(Control),
}
