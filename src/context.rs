//! Per-actor thread-local state.
//!
//! An actor's own mailbox/owner/links are realized as a single
//! `thread_local!` cell holding an [`ActorRuntimeState`], installed by [`crate::spawn`]
//! /[`crate::spawn_linked`] before the actor body runs, and torn down on the way out.
//! See `spawn.rs` for the teardown sequence.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};

use crate::handle::Handle;
use crate::mailbox::Mailbox;
use crate::message::Envelope;

pub(crate) struct ActorRuntimeState {
    pub(crate) self_handle: Handle,
    pub(crate) owner: Option<Handle>,
    pub(crate) owner_dead: bool,
    pub(crate) links: HashMap<Handle, bool>,
    pub(crate) mailbox: Mailbox,
    pub(crate) local: VecDeque<Envelope>,
}

thread_local! {
    pub(crate) static CONTEXT: RefCell<Option<ActorRuntimeState>> = const { RefCell::new(None) };
}

/// Returns the calling actor's handle, if the calling thread is currently running
/// inside one (installed by `spawn`/`spawn_linked`).
pub(crate) fn current_handle() -> Option<Handle> {
    CONTEXT.with(|c| c.borrow().as_ref().map(|s| s.self_handle.clone()))
}

/// Registers `child` as a link of the *calling* actor, if it is running inside one.
/// A no-op when called from outside any actor context (e.g. an application's `main`):
/// there is no current actor's `links` map to register against.
pub(crate) fn register_link_on_current(child: Handle, bidirectional: bool) {
    CONTEXT.with(|c| {
        if let Some(state) = c.borrow_mut().as_mut() {
            state.links.insert(child, bidirectional);
        }
    });
}

/// The current actor's own handle.
///
/// # Panics
/// Panics if called from a thread that is not running inside an actor (i.e. was not
/// started via `spawn`/`spawn_linked`).
pub fn this_id() -> Handle {
    current_handle().expect("this_id() called outside of an actor context")
}
