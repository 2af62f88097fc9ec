//! Actor handles: opaque, shareable, hashable identifiers bound to exactly one
//! mailbox.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use crossbeam_channel as cb;

use crate::error::ActorError;
use crate::message::{Control, Envelope};

static NEXT_ACTOR_ID: AtomicU64 = AtomicU64::new(1);

/// A unique, monotonically increasing actor identifier.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ActorId(u64);

impl ActorId {
    fn next() -> Self {
        Self(NEXT_ACTOR_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// The raw numeric id, for diagnostics.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ActorId({})", self.0)
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "actor#{}", self.0)
    }
}

/// What to do when a `send` finds the destination at or over its configured
/// capacity. See [`crate::set_capacity`].
#[derive(Clone)]
pub enum CapacityPolicy {
    /// Wait until the consumer frees a slot, then enqueue.
    Block,
    /// Return `Err(ActorError::SendFull)` without enqueueing.
    Fail,
    /// Silently discard the new message.
    Drop,
    /// Call the closure with the destination handle. If it returns `true`, the
    /// message is discarded as in `Drop`; otherwise behaves as `Block`.
    Callback(Arc<dyn Fn(Handle) -> bool + Send + Sync>),
}

impl fmt::Debug for CapacityPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CapacityPolicy::Block => write!(f, "Block"),
            CapacityPolicy::Fail => write!(f, "Fail"),
            CapacityPolicy::Drop => write!(f, "Drop"),
            CapacityPolicy::Callback(_) => write!(f, "Callback(..)"),
        }
    }
}

pub(crate) struct CapacityConfig {
    pub(crate) limit: usize,
    pub(crate) policy: CapacityPolicy,
}

struct HandleInner {
    id: ActorId,
    sender: cb::Sender<Envelope>,
    open: Arc<AtomicBool>,
    capacity: Mutex<Option<CapacityConfig>>,
    space_available: Condvar,
    space_lock: Mutex<()>,
}

/// An opaque, `Clone`-able reference to a single actor's mailbox.
///
/// Two handles are equal iff they name the same actor. Hashable, so it can be used
/// as a `HashMap` key (as the per-actor `links` map does).
#[derive(Clone)]
pub struct Handle(Arc<HandleInner>);

impl Handle {
    pub(crate) fn new(sender: cb::Sender<Envelope>) -> (Self, Arc<AtomicBool>) {
        let open = Arc::new(AtomicBool::new(true));
        let inner = Arc::new(HandleInner {
            id: ActorId::next(),
            sender,
            open: open.clone(),
            capacity: Mutex::new(None),
            space_available: Condvar::new(),
            space_lock: Mutex::new(()),
        });
        (Handle(inner), open)
    }

    /// This actor's unique id.
    pub fn id(&self) -> ActorId {
        self.0.id
    }

    /// True until this actor's mailbox has been closed (at teardown).
    pub fn is_open(&self) -> bool {
        self.0.open.load(Ordering::Acquire)
    }

    pub(crate) fn close(&self) {
        self.0.open.store(false, Ordering::Release);
    }

    pub(crate) fn set_capacity(&self, limit: usize, policy: CapacityPolicy) {
        *self.0.capacity.lock().unwrap() = Some(CapacityConfig { limit, policy });
    }

    /// Signals any sender currently waiting on `Block`/`Callback` backpressure that
    /// a slot may have freed up. Called by the consumer after draining a batch.
    pub(crate) fn notify_space_available(&self) {
        self.0.space_available.notify_all();
    }

    fn wait_for_space(&self) {
        let guard = self.0.space_lock.lock().unwrap();
        // Bounded wait: if this actor never consumes again (e.g. it has exited and
        // this send race lost to that), a producer must not wedge forever.
        let _ = self.0.space_available.wait_timeout(guard, Duration::from_millis(25));
    }

    fn deliver(&self, env: Envelope) -> Result<(), ActorError> {
        if !self.is_open() {
            return Ok(());
        }
        loop {
            enum Action {
                SendNow,
                Drop,
                Fail,
                Wait,
            }
            let action = {
                let guard = self.0.capacity.lock().unwrap();
                match guard.as_ref() {
                    None => Action::SendNow,
                    Some(cfg) if self.0.sender.len() < cfg.limit => Action::SendNow,
                    Some(cfg) => match &cfg.policy {
                        CapacityPolicy::Drop => Action::Drop,
                        CapacityPolicy::Fail => Action::Fail,
                        CapacityPolicy::Block => Action::Wait,
                        CapacityPolicy::Callback(cb) => {
                            if (cb.as_ref())(self.clone()) {
                                Action::Drop
                            } else {
                                Action::Wait
                            }
                        }
                    },
                }
            };
            match action {
                Action::SendNow => {
                    let _ = self.0.sender.send(env);
                    return Ok(());
                }
                Action::Drop => return Ok(()),
                Action::Fail => return Err(ActorError::SendFull),
                Action::Wait => {
                    self.wait_for_space();
                    continue;
                }
            }
        }
    }

    /// Capacity-policy-aware user send. Used by [`crate::send`] and friends.
    pub(crate) fn deliver_user(&self, payload: crate::dynamic::DynValue) -> Result<(), ActorError> {
        self.deliver(Envelope::User(payload))
    }

    /// Control signals bypass capacity policy entirely (they must not deadlock
    /// teardown) and are silently dropped if the destination is already closed.
    pub(crate) fn deliver_control(&self, control: Control) {
        if self.is_open() {
            let _ = self.0.sender.send(Envelope::Control(control));
        }
    }
}

impl PartialEq for Handle {
    fn eq(&self, other: &Self) -> bool {
        self.0.id == other.0.id
    }
}
impl Eq for Handle {}

impl Hash for Handle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.id.hash(state);
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle").field("id", &self.0.id).field("open", &self.is_open()).finish()
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.id)
    }
}
