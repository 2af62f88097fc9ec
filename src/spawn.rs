//! `spawn`/`spawn_linked` and the teardown sequence that runs when an actor body
//! returns, errors out, or panics.

use std::collections::{HashMap, VecDeque};
use std::thread;

use crate::context::{current_handle, register_link_on_current, ActorRuntimeState, CONTEXT};
use crate::handle::Handle;
use crate::mailbox::Mailbox;
use crate::message::{Control, Envelope};

enum SpawnKind {
    Owned,
    Linked,
}

fn spawn_internal<F>(body: F, kind: SpawnKind) -> Handle
where
    F: FnOnce() + Send + 'static,
{
    let parent = current_handle();
    let (sender, mailbox) = Mailbox::channel();
    let (child_handle, _open) = Handle::new(sender);

    let (child_owner, child_links): (Option<Handle>, HashMap<Handle, bool>) = match (&kind, parent) {
        (SpawnKind::Owned, Some(parent)) => {
            register_link_on_current(child_handle.clone(), false);
            (Some(parent), HashMap::new())
        }
        (SpawnKind::Owned, None) => (None, HashMap::new()),
        (SpawnKind::Linked, Some(parent)) => {
            register_link_on_current(child_handle.clone(), true);
            let mut links = HashMap::new();
            links.insert(parent, true);
            (None, links)
        }
        (SpawnKind::Linked, None) => (None, HashMap::new()),
    };

    let thread_handle = child_handle.clone();
    thread::Builder::new()
        .name(format!("actor-{}", thread_handle.id().as_u64()))
        .spawn(move || {
            CONTEXT.with(|c| {
                *c.borrow_mut() = Some(ActorRuntimeState {
                    self_handle: thread_handle,
                    owner: child_owner,
                    owner_dead: false,
                    links: child_links,
                    mailbox,
                    local: VecDeque::new(),
                });
            });
            let _teardown = TeardownGuard;
            body();
        })
        .expect("failed to spawn actor thread");

    child_handle
}

/// Spawns `body` as a new actor owned by the calling actor (one-way supervision:
/// the child's `owner` is set to the caller, but the caller does not automatically
/// react to the child's death unless it links separately).
///
/// If called from a thread that is not itself inside an actor, the new actor has no
/// owner; there is no current actor to own it.
pub fn spawn<F>(body: F) -> Handle
where
    F: FnOnce() + Send + 'static,
{
    spawn_internal(body, SpawnKind::Owned)
}

/// Spawns `body` as a new actor symmetrically linked to the calling actor: either
/// side's termination delivers `LinkDead` (and, if the link is bidirectional,
/// raises `LinkTerminated`) to the other's next receive.
pub fn spawn_linked<F>(body: F) -> Handle
where
    F: FnOnce() + Send + 'static,
{
    spawn_internal(body, SpawnKind::Linked)
}

/// Runs exactly once per actor, regardless of whether its body returned normally,
/// returned via an `ActorError` unwind, or panicked. Every actor's link/owner
/// obligations are honored on exit as a result.
struct TeardownGuard;

impl Drop for TeardownGuard {
    fn drop(&mut self) {
        let state = CONTEXT.with(|c| c.borrow_mut().take());
        if let Some(mut state) = state {
            teardown(&mut state);
        }
    }
}

fn teardown(state: &mut ActorRuntimeState) {
    state.self_handle.close();

    let mut pending: Vec<Envelope> = state.local.drain(..).collect();
    while let Ok(env) = state.mailbox.receiver().try_recv() {
        pending.push(env);
    }
    for env in pending {
        if let Envelope::Control(Control::LinkDead(h)) = env {
            state.links.remove(&h);
        }
        // User envelopes are discarded: no guaranteed delivery after close.
    }

    for (peer, _bidirectional) in state.links.drain() {
        peer.deliver_control(Control::LinkDead(state.self_handle.clone()));
    }
    if let Some(owner) = state.owner.take() {
        owner.deliver_control(Control::LinkDead(state.self_handle.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::receive::receive;
    use crate::handler::on1_always;
    use crate::send::send;
    use std::sync::mpsc;
    use std::time::Duration;

    // 1. spawn from outside any actor context yields a root actor (no owner).
    #[test]
    fn spawn_from_main_has_no_owner_effect() {
        let (done_tx, done_rx) = mpsc::channel();
        let child = spawn(move || {
            let mut got = None;
            receive(&mut [on1_always::<i32, _>(|v| got = Some(*v))]).unwrap();
            done_tx.send(got.unwrap()).unwrap();
        });
        send(&child, 7i32).unwrap();
        assert_eq!(done_rx.recv_timeout(Duration::from_secs(2)).unwrap(), 7);
    }

    // 2. spawn_linked from outside any actor context still produces a usable actor.
    #[test]
    fn spawn_linked_from_main_still_works() {
        let (done_tx, done_rx) = mpsc::channel();
        let child = spawn_linked(move || {
            receive(&mut [on1_always::<&'static str, _>(|_v| ())]).unwrap();
            done_tx.send(()).unwrap();
        });
        send(&child, "go").unwrap();
        done_rx.recv_timeout(Duration::from_secs(2)).unwrap();
    }
}
