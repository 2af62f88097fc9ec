//! The pattern-matched `receive` primitive and its timed/single-type variants.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crossbeam_channel::TryRecvError;

use crate::context::CONTEXT;
use crate::dynamic::{Args2, Args3, Args4, DynValue};
use crate::error::ActorError;
use crate::handle::Handle;
use crate::handler::{on1, on2, on3, on4, Handler, MismatchHandler};
use crate::message::{Control, Envelope};

enum ControlOutcome {
    /// The control message is fully handled and should not be reinserted.
    Consumed,
    /// The control message stays queued, unchanged, for a later pass.
    Kept(Handle),
}

/// Applies the owner/link termination rule to a single `LinkDead(who)` signal.
fn handle_control(
    who: Handle,
    owner: &mut Option<Handle>,
    owner_dead: &mut bool,
    links: &mut std::collections::HashMap<Handle, bool>,
) -> Result<ControlOutcome, ActorError> {
    if owner.as_ref() == Some(&who) {
        *owner_dead = true;
        Ok(ControlOutcome::Kept(who))
    } else if let Some(bidirectional) = links.remove(&who) {
        if bidirectional {
            Err(ActorError::LinkTerminated { who })
        } else {
            // Owned-only link: stays queued once, inert; the next pass finds it
            // neither the owner nor in `links` and drops it (see DESIGN.md).
            Ok(ControlOutcome::Kept(who))
        }
    } else {
        Ok(ControlOutcome::Consumed)
    }
}

/// Applies [`handle_control`] against the current actor's state under a borrow
/// that is released as soon as the bookkeeping is done. Never called with a
/// `CONTEXT` borrow already held, and never itself calls into user code, so it
/// cannot be part of a reentrant `this_id`/`spawn`/`receive` call chain.
fn handle_control_on_context(who: Handle) -> Result<ControlOutcome, ActorError> {
    CONTEXT.with(|cell| {
        let mut guard = cell.borrow_mut();
        let ctx = guard.as_mut().expect("receive called outside of an actor context");
        handle_control(who, &mut ctx.owner, &mut ctx.owner_dead, &mut ctx.links)
    })
}

/// Tries every handler in order against `payload`, by reference.
/// Returns `true` if some handler consumed the message (ownership is not taken
/// here; the caller removes the envelope from its queue only on `true`).
fn try_handlers(handlers: &mut [Box<dyn Handler>], payload: &DynValue) -> Result<bool, ActorError> {
    use crate::handler::MatchAttempt;
    for h in handlers.iter_mut() {
        match h.attempt(payload)? {
            MatchAttempt::Mismatch => continue,
            MatchAttempt::Handled(true) => return Ok(true),
            MatchAttempt::Handled(false) => continue,
        }
    }
    Ok(false)
}

/// Walks `queue` once, handling control messages inline and testing user messages
/// against `handlers`. Returns the consumed payload as soon as one is found, having
/// already removed it from `queue`; control messages are processed as a side effect
/// of the same single pass and never themselves cause a return.
///
/// Never holds a `CONTEXT` borrow across a handler call: `handle_control_on_context`
/// takes and releases its own short borrow, and `try_handlers` (which runs arbitrary
/// user closures) never touches `CONTEXT` at all. A handler is therefore free to call
/// `this_id`/`spawn`/`spawn_linked`/`receive` without deadlocking against a borrow
/// this function is still holding.
fn scan_and_dispatch(queue: &mut VecDeque<Envelope>, handlers: &mut [Box<dyn Handler>]) -> Result<Option<DynValue>, ActorError> {
    let mut i = 0;
    while i < queue.len() {
        let is_control = matches!(queue[i], Envelope::Control(_));
        if is_control {
            let env = queue.remove(i).expect("index in bounds");
            let Envelope::Control(Control::LinkDead(who)) = env else {
                unreachable!("checked above")
            };
            match handle_control_on_context(who)? {
                ControlOutcome::Consumed => { /* dropped; stay at i */ }
                ControlOutcome::Kept(who) => {
                    queue.insert(i, Envelope::Control(Control::LinkDead(who)));
                    i += 1;
                }
            }
        } else {
            let consumed = match &queue[i] {
                Envelope::User(payload) => try_handlers(handlers, payload)?,
                Envelope::Control(_) => unreachable!("checked above"),
            };
            if consumed {
                let env = queue.remove(i).expect("index in bounds");
                let Envelope::User(payload) = env else {
                    unreachable!("checked above")
                };
                return Ok(Some(payload));
            }
            i += 1;
        }
    }
    Ok(None)
}

enum AcquireError {
    TimedOut,
    Owner(ActorError),
}

/// Drains every envelope currently available on the channel into one batch,
/// blocking (optionally bounded by `deadline`) only if none are available yet.
///
/// Takes its own short `CONTEXT` borrows for the receiver/handle/owner-death check
/// and releases each before blocking, so a consumer that never wakes again cannot
/// hold the actor's state hostage, and nothing here overlaps a handler call.
fn acquire_batch(deadline: Option<Instant>) -> Result<Vec<Envelope>, AcquireError> {
    let (receiver, self_handle) = CONTEXT.with(|cell| {
        let guard = cell.borrow();
        let ctx = guard.as_ref().expect("receive called outside of an actor context");
        (ctx.mailbox.receiver().clone(), ctx.self_handle.clone())
    });

    match receiver.try_recv() {
        Ok(first) => {
            self_handle.notify_space_available();
            return Ok(drain_rest(first, &receiver));
        }
        Err(TryRecvError::Disconnected) | Err(TryRecvError::Empty) => {}
    }

    let owner_dead = CONTEXT.with(|cell| {
        let guard = cell.borrow();
        guard.as_ref().expect("receive called outside of an actor context").owner_dead
    });
    if owner_dead {
        let who = CONTEXT.with(|cell| {
            let mut guard = cell.borrow_mut();
            let ctx = guard.as_mut().expect("receive called outside of an actor context");
            ctx.owner_dead = false;
            ctx.owner.take().expect("owner_dead implies owner was set")
        });
        return Err(AcquireError::Owner(ActorError::OwnerTerminated { who }));
    }

    let wait_result = match deadline {
        None => receiver.recv().map_err(|_| ()),
        Some(dl) => {
            let remaining = dl.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(AcquireError::TimedOut);
            }
            receiver.recv_timeout(remaining).map_err(|_| ())
        }
    };

    match wait_result {
        Ok(first) => {
            self_handle.notify_space_available();
            Ok(drain_rest(first, &receiver))
        }
        Err(()) => Err(AcquireError::TimedOut),
    }
}

fn drain_rest(first: Envelope, receiver: &crossbeam_channel::Receiver<Envelope>) -> Vec<Envelope> {
    let mut batch = vec![first];
    while let Ok(e) = receiver.try_recv() {
        batch.push(e);
    }
    batch
}

enum ReceiveOutcome {
    Consumed(DynValue),
    TimedOut,
}

/// Takes `ctx.local` out from under a short borrow, so the scan below (which may
/// call into user handlers, and those may reenter `this_id`/`spawn`/`receive` on
/// this same thread) never runs while the borrow is held.
fn take_local() -> VecDeque<Envelope> {
    CONTEXT.with(|cell| {
        let mut guard = cell.borrow_mut();
        let ctx = guard.as_mut().expect("receive called outside of an actor context");
        std::mem::take(&mut ctx.local)
    })
}

/// Splices `leftover` (this call's unconsumed remainder, pulled out before dispatch)
/// back onto the front of `ctx.local`, ahead of anything a reentrant `receive` may
/// have deferred there in the meantime.
fn return_leftover(mut leftover: VecDeque<Envelope>) {
    CONTEXT.with(|cell| {
        let mut guard = cell.borrow_mut();
        let ctx = guard.as_mut().expect("receive called outside of an actor context");
        leftover.append(&mut ctx.local);
        ctx.local = leftover;
    });
}

fn receive_core(handlers: &mut [Box<dyn Handler>], deadline: Option<Instant>) -> Result<ReceiveOutcome, ActorError> {
    // Step 1: one pass over whatever was deferred by earlier receives.
    let mut local = take_local();
    let found = scan_and_dispatch(&mut local, handlers);
    return_leftover(local);
    if let Some(payload) = found? {
        return Ok(ReceiveOutcome::Consumed(payload));
    }

    loop {
        let batch = match acquire_batch(deadline) {
            Ok(batch) => batch,
            Err(AcquireError::TimedOut) => return Ok(ReceiveOutcome::TimedOut),
            Err(AcquireError::Owner(e)) => return Err(e),
        };

        let mut batch_q: VecDeque<Envelope> = batch.into_iter().collect();
        let found = scan_and_dispatch(&mut batch_q, handlers);
        return_leftover(batch_q);
        if let Some(payload) = found? {
            return Ok(ReceiveOutcome::Consumed(payload));
        }
    }
}

/// Blocks until some `handlers` entry consumes a message, or an `ActorError`
/// (`OwnerTerminated`/`LinkTerminated`) is raised by the supervision machinery.
pub fn receive(handlers: &mut [Box<dyn Handler>]) -> Result<(), ActorError> {
    match receive_core(handlers, None)? {
        ReceiveOutcome::Consumed(_) => Ok(()),
        ReceiveOutcome::TimedOut => unreachable!("an untimed receive cannot time out"),
    }
}

/// Like [`receive`], but gives up after `timeout` with no match, returning `false`
/// rather than raising. Returns `true` if a message was consumed. The deadline is
/// computed once at entry and does not reset on intermediate wakeups.
pub fn receive_timeout(timeout: Duration, handlers: &mut [Box<dyn Handler>]) -> Result<bool, ActorError> {
    let deadline = Instant::now() + timeout;
    match receive_core(handlers, Some(deadline))? {
        ReceiveOutcome::Consumed(_) => Ok(true),
        ReceiveOutcome::TimedOut => Ok(false),
    }
}

/// Blocks until a message of exactly type `T` arrives, returning it. Any other
/// message shape raises `MessageMismatch` rather than being deferred.
pub fn receive_only<T: Send + 'static>() -> Result<T, ActorError> {
    let mut handlers: Vec<Box<dyn Handler>> = vec![
        on1::<T, _>(|_v: &T| true),
        Box::new(MismatchHandler { expected: std::any::TypeId::of::<T>() }),
    ];
    match receive_core(&mut handlers, None)? {
        ReceiveOutcome::Consumed(payload) => Ok(payload.get::<T>()),
        ReceiveOutcome::TimedOut => unreachable!("an untimed receive cannot time out"),
    }
}

/// Blocks until a message sent with [`crate::send2`] arrives. Matches the same
/// shape [`crate::on2`] does, distinct from a bare `(T1, T2)` tuple; any other
/// shape (including that bare tuple) raises `MessageMismatch`.
pub fn receive_only2<T1: Send + 'static, T2: Send + 'static>() -> Result<(T1, T2), ActorError> {
    let mut handlers: Vec<Box<dyn Handler>> = vec![
        on2::<T1, T2, _>(|_a, _b| true),
        Box::new(MismatchHandler { expected: std::any::TypeId::of::<Args2<T1, T2>>() }),
    ];
    match receive_core(&mut handlers, None)? {
        ReceiveOutcome::Consumed(payload) => {
            let Args2(a, b) = payload.get::<Args2<T1, T2>>();
            Ok((a, b))
        }
        ReceiveOutcome::TimedOut => unreachable!("an untimed receive cannot time out"),
    }
}

/// Blocks until a message sent with [`crate::send3`] arrives. See [`receive_only2`].
pub fn receive_only3<T1: Send + 'static, T2: Send + 'static, T3: Send + 'static>() -> Result<(T1, T2, T3), ActorError> {
    let mut handlers: Vec<Box<dyn Handler>> = vec![
        on3::<T1, T2, T3, _>(|_a, _b, _c| true),
        Box::new(MismatchHandler { expected: std::any::TypeId::of::<Args3<T1, T2, T3>>() }),
    ];
    match receive_core(&mut handlers, None)? {
        ReceiveOutcome::Consumed(payload) => {
            let Args3(a, b, c) = payload.get::<Args3<T1, T2, T3>>();
            Ok((a, b, c))
        }
        ReceiveOutcome::TimedOut => unreachable!("an untimed receive cannot time out"),
    }
}

/// Blocks until a message sent with [`crate::send4`] arrives. See [`receive_only2`].
pub fn receive_only4<T1: Send + 'static, T2: Send + 'static, T3: Send + 'static, T4: Send + 'static>(
) -> Result<(T1, T2, T3, T4), ActorError> {
    let mut handlers: Vec<Box<dyn Handler>> = vec![
        on4::<T1, T2, T3, T4, _>(|_a, _b, _c, _d| true),
        Box::new(MismatchHandler { expected: std::any::TypeId::of::<Args4<T1, T2, T3, T4>>() }),
    ];
    match receive_core(&mut handlers, None)? {
        ReceiveOutcome::Consumed(payload) => {
            let Args4(a, b, c, d) = payload.get::<Args4<T1, T2, T3, T4>>();
            Ok((a, b, c, d))
        }
        ReceiveOutcome::TimedOut => unreachable!("an untimed receive cannot time out"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{on1_always, on2, on2_always, on_any_always};
    use crate::send::{send, send2};
    use crate::spawn::{spawn, spawn_linked};
    use std::sync::mpsc;
    use std::time::Duration;

    // 1. FIFO from a single producer: two sends, a generic receive consumes them
    //    in order.
    #[test]
    fn fifo_from_single_producer() {
        let (result_tx, result_rx) = mpsc::channel();
        let child = spawn(move || {
            let mut seen = Vec::new();
            for _ in 0..2 {
                receive(&mut [on1_always::<i32, _>(|v| seen.push(*v))]).unwrap();
            }
            result_tx.send(seen).unwrap();
        });
        send(&child, 1i32).unwrap();
        send(&child, 2i32).unwrap();
        assert_eq!(result_rx.recv_timeout(Duration::from_secs(2)).unwrap(), vec![1, 2]);
    }

    // 2. Selective receive preserves unmatched messages for a later receive.
    #[test]
    fn selective_receive_preserves_unmatched() {
        let (result_tx, result_rx) = mpsc::channel();
        let child = spawn(move || {
            let mut b_seen = None;
            let mut a_seen = None;
            receive(&mut [on1::<&'static str, _>(|v| {
                if *v == "B" {
                    b_seen = Some(*v);
                    true
                } else {
                    false
                }
            })])
            .unwrap();
            receive(&mut [on1_always::<&'static str, _>(|v| a_seen = Some(*v))]).unwrap();
            result_tx.send((a_seen, b_seen)).unwrap();
        });
        send(&child, "A").unwrap();
        send(&child, "B").unwrap();
        assert_eq!(result_rx.recv_timeout(Duration::from_secs(2)).unwrap(), (Some("A"), Some("B")));
    }

    // 3. Wildcard matches anything.
    #[test]
    fn wildcard_matches_anything() {
        let (result_tx, result_rx) = mpsc::channel();
        let child = spawn(move || {
            let mut matched = false;
            receive(&mut [on_any_always(|_v| matched = true)]).unwrap();
            result_tx.send(matched).unwrap();
        });
        send(&child, 3.14f64).unwrap();
        assert!(result_rx.recv_timeout(Duration::from_secs(2)).unwrap());
    }

    // 5. Owner termination: child's next receive raises OwnerTerminated once the
    //    parent exits; a later receive does not re-raise.
    #[test]
    fn owner_termination_raises_once() {
        let (result_tx, result_rx) = mpsc::channel();
        let _parent = spawn(move || {
            spawn(move || {
                let first = receive(&mut [on1_always::<i32, _>(|_v| ())]);
                let first_was_owner_terminated = matches!(first, Err(ActorError::OwnerTerminated { .. }));
                let second = receive_timeout(Duration::from_millis(100), &mut [on1_always::<i32, _>(|_v| ())]);
                result_tx.send((first_was_owner_terminated, second.is_ok())).unwrap();
            });
            // Parent returns immediately, which tears down and notifies the child
            // (its owner) with LinkDead(parent).
        });
        let (first_was_owner_terminated, second_did_not_error) =
            result_rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert!(first_was_owner_terminated);
        assert!(second_did_not_error);
    }

    // 6. Link symmetry: a linked peer's exit raises LinkTerminated once; a later
    //    receive does not re-raise (the dead handle is gone from links).
    #[test]
    fn link_symmetry_raises_link_terminated() {
        let (result_tx, result_rx) = mpsc::channel();
        spawn(move || {
            spawn_linked(move || {
                let first = receive(&mut [on1_always::<i32, _>(|_v| ())]);
                let first_was_link_terminated = matches!(first, Err(ActorError::LinkTerminated { .. }));
                let second = receive_timeout(Duration::from_millis(100), &mut [on1_always::<i32, _>(|_v| ())]);
                result_tx.send((first_was_link_terminated, second.is_ok())).unwrap();
            });
            // This actor (linked to the one just spawned) returns immediately,
            // notifying its link with LinkDead(self).
        });
        let (first_was_link_terminated, second_did_not_error) =
            result_rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert!(first_was_link_terminated);
        assert!(second_did_not_error);
    }

    // 7. receive_timeout returns false within budget with no side effects.
    #[test]
    fn receive_timeout_returns_false_without_match() {
        let (result_tx, result_rx) = mpsc::channel();
        let child = spawn(move || {
            let got = receive_timeout(Duration::from_millis(50), &mut [on1_always::<i32, _>(|_v| ())]).unwrap();
            result_tx.send(got).unwrap();
        });
        assert!(!result_rx.recv_timeout(Duration::from_secs(2)).unwrap());
        drop(child);
    }

    // 8. Tuple discrimination: (i32,i32) handler does not match (i64,i32) shape,
    //    and a bare tuple send matches a single-tuple-argument handler.
    #[test]
    fn tuple_discrimination() {
        let (result_tx, result_rx) = mpsc::channel();
        let child = spawn(move || {
            let mut wrong_shape_matched = false;
            let mut right_shape_matched = false;
            receive(&mut [
                on2::<i64, i32, _>(|_a, _b| {
                    wrong_shape_matched = true;
                    true
                }),
                on2_always::<i32, i32, _>(|a, b| {
                    right_shape_matched = *a == 42 && *b == 86;
                }),
            ])
            .unwrap();
            result_tx.send((wrong_shape_matched, right_shape_matched)).unwrap();
        });
        send2(&child, 42i32, 86i32).unwrap();
        assert_eq!(result_rx.recv_timeout(Duration::from_secs(2)).unwrap(), (false, true));
    }
}
