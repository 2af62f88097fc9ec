//! `send` and its fixed-arity sugar.

use crate::dynamic::{Args2, Args3, Args4, DynValue};
use crate::error::ActorError;
use crate::handle::Handle;

/// Sends a single value to `dest`. No implicit wrapping into a 1-tuple happens
/// here: a bare value and a 1-tuple of the same type are distinct static types
/// (see `dynamic.rs` tests), so `send(h, v)` matches a handler declared over `T`,
/// and `send(h, (v,))` matches one declared over `(T,)`.
///
/// Returns `Err(ActorError::SendFull)` only under capacity policy `Fail` when the
/// destination is at or over its configured limit. Sending to a closed mailbox is
/// a silent no-op.
pub fn send<T: Send + 'static>(dest: &Handle, value: T) -> Result<(), ActorError> {
    dest.deliver_user(DynValue::new(value))
}

/// Sends a 2-argument message, matching a handler built with [`crate::on2`].
/// Carries its own wire shape distinct from a bare `(T1, T2)` tuple, so this is
/// not interchangeable with `send(dest, (v1, v2))`: the latter matches only a
/// handler declared over `(T1, T2)`, never [`crate::on2`].
pub fn send2<T1: Send + 'static, T2: Send + 'static>(dest: &Handle, v1: T1, v2: T2) -> Result<(), ActorError> {
    dest.deliver_user(DynValue::new(Args2(v1, v2)))
}

/// Sends a 3-argument message, matching a handler built with [`crate::on3`]. See
/// [`send2`] on why this does not share a wire shape with a bare `(T1, T2, T3)`.
pub fn send3<T1: Send + 'static, T2: Send + 'static, T3: Send + 'static>(
    dest: &Handle,
    v1: T1,
    v2: T2,
    v3: T3,
) -> Result<(), ActorError> {
    dest.deliver_user(DynValue::new(Args3(v1, v2, v3)))
}

/// Sends a 4-argument message, matching a handler built with [`crate::on4`]. See
/// [`send2`] on why this does not share a wire shape with a bare `(T1, T2, T3, T4)`.
pub fn send4<T1: Send + 'static, T2: Send + 'static, T3: Send + 'static, T4: Send + 'static>(
    dest: &Handle,
    v1: T1,
    v2: T2,
    v3: T3,
    v4: T4,
) -> Result<(), ActorError> {
    dest.deliver_user(DynValue::new(Args4(v1, v2, v3, v4)))
}

/// Configures the capacity policy applied when `send`ing to `dest` finds its
/// mailbox at or over `limit` messages. See [`crate::CapacityPolicy`].
pub fn set_capacity(dest: &Handle, limit: usize, policy: crate::handle::CapacityPolicy) {
    dest.set_capacity(limit, policy);
}
