//! Pattern-matched handlers passed to `receive`/`receive_timeout`.
//!
//! Each handler is realized as a heterogeneous `Box<dyn Handler>`; the array of
//! trait objects this corpus's `Selector` (`lumen-runtime/src/select.rs`) uses to
//! type-erase a set of closures over different concrete types into one object-safe
//! interface. A handler tests a message's shape by reference (`converts_to`/
//! `downcast_ref`) and only "consumes" ownership by removing the envelope from its
//! queue once it has committed to accepting; see `receive.rs`.

use std::any::TypeId;
use std::marker::PhantomData;

use crate::dynamic::{Args2, Args3, Args4, DynValue};
use crate::error::ActorError;

/// Outcome of testing a single handler against a message.
pub(crate) enum MatchAttempt {
    /// The message's shape did not match this handler's declared parameter types.
    Mismatch,
    /// The shape matched; `bool` is whether the handler consumed the message.
    Handled(bool),
}

/// A single pattern arm passed to `receive`.
///
/// Not implemented directly by callers; use [`on1`], [`on2`], [`on3`], [`on4`], or
/// [`on_any`] to build one from a closure.
pub trait Handler: Send {
    #[doc(hidden)]
    fn attempt(&mut self, payload: &DynValue) -> Result<MatchAttempt, ActorError>;
}

struct FnHandler1<T, F> {
    f: F,
    _marker: PhantomData<fn(&T)>,
}

impl<T, F> Handler for FnHandler1<T, F>
where
    T: 'static,
    F: FnMut(&T) -> bool + Send,
{
    fn attempt(&mut self, payload: &DynValue) -> Result<MatchAttempt, ActorError> {
        match payload.downcast_ref::<T>() {
            Some(v) => Ok(MatchAttempt::Handled((self.f)(v))),
            None => Ok(MatchAttempt::Mismatch),
        }
    }
}

/// A handler matching a single value of type `T1`.
pub fn on1<T1, F>(f: F) -> Box<dyn Handler>
where
    T1: 'static,
    F: FnMut(&T1) -> bool + Send + 'static,
{
    Box::new(FnHandler1 { f, _marker: PhantomData })
}

/// Like [`on1`], but for a handler that always consumes (no boolean decision).
pub fn on1_always<T1, F>(mut f: F) -> Box<dyn Handler>
where
    T1: 'static,
    F: FnMut(&T1) + Send + 'static,
{
    on1::<T1, _>(move |v| {
        f(v);
        true
    })
}

struct FnHandler2<T1, T2, F> {
    f: F,
    _marker: PhantomData<fn(&T1, &T2)>,
}

impl<T1, T2, F> Handler for FnHandler2<T1, T2, F>
where
    T1: 'static,
    T2: 'static,
    F: FnMut(&T1, &T2) -> bool + Send,
{
    fn attempt(&mut self, payload: &DynValue) -> Result<MatchAttempt, ActorError> {
        match payload.downcast_ref::<Args2<T1, T2>>() {
            Some(Args2(a, b)) => Ok(MatchAttempt::Handled((self.f)(a, b))),
            None => Ok(MatchAttempt::Mismatch),
        }
    }
}

/// A handler matching a [`crate::send2`] call, destructured into two arguments.
/// Does not match a bare `(T1, T2)` tuple sent with [`crate::send`]; the two are
/// distinct wire shapes (see `dynamic.rs`).
pub fn on2<T1, T2, F>(f: F) -> Box<dyn Handler>
where
    T1: 'static,
    T2: 'static,
    F: FnMut(&T1, &T2) -> bool + Send + 'static,
{
    Box::new(FnHandler2 { f, _marker: PhantomData })
}

/// Like [`on2`], but for a handler that always consumes.
pub fn on2_always<T1, T2, F>(mut f: F) -> Box<dyn Handler>
where
    T1: 'static,
    T2: 'static,
    F: FnMut(&T1, &T2) + Send + 'static,
{
    on2::<T1, T2, _>(move |a, b| {
        f(a, b);
        true
    })
}

struct FnHandler3<T1, T2, T3, F> {
    f: F,
    _marker: PhantomData<fn(&T1, &T2, &T3)>,
}

impl<T1, T2, T3, F> Handler for FnHandler3<T1, T2, T3, F>
where
    T1: 'static,
    T2: 'static,
    T3: 'static,
    F: FnMut(&T1, &T2, &T3) -> bool + Send,
{
    fn attempt(&mut self, payload: &DynValue) -> Result<MatchAttempt, ActorError> {
        match payload.downcast_ref::<Args3<T1, T2, T3>>() {
            Some(Args3(a, b, c)) => Ok(MatchAttempt::Handled((self.f)(a, b, c))),
            None => Ok(MatchAttempt::Mismatch),
        }
    }
}

/// A handler matching a [`crate::send3`] call. See [`on2`] on why this does not
/// match a bare `(T1, T2, T3)` tuple.
pub fn on3<T1, T2, T3, F>(f: F) -> Box<dyn Handler>
where
    T1: 'static,
    T2: 'static,
    T3: 'static,
    F: FnMut(&T1, &T2, &T3) -> bool + Send + 'static,
{
    Box::new(FnHandler3 { f, _marker: PhantomData })
}

struct FnHandler4<T1, T2, T3, T4, F> {
    f: F,
    _marker: PhantomData<fn(&T1, &T2, &T3, &T4)>,
}

impl<T1, T2, T3, T4, F> Handler for FnHandler4<T1, T2, T3, T4, F>
where
    T1: 'static,
    T2: 'static,
    T3: 'static,
    T4: 'static,
    F: FnMut(&T1, &T2, &T3, &T4) -> bool + Send,
{
    fn attempt(&mut self, payload: &DynValue) -> Result<MatchAttempt, ActorError> {
        match payload.downcast_ref::<Args4<T1, T2, T3, T4>>() {
            Some(Args4(a, b, c, d)) => Ok(MatchAttempt::Handled((self.f)(a, b, c, d))),
            None => Ok(MatchAttempt::Mismatch),
        }
    }
}

/// A handler matching a [`crate::send4`] call. See [`on2`] on why this does not
/// match a bare `(T1, T2, T3, T4)` tuple.
pub fn on4<T1, T2, T3, T4, F>(f: F) -> Box<dyn Handler>
where
    T1: 'static,
    T2: 'static,
    T3: 'static,
    T4: 'static,
    F: FnMut(&T1, &T2, &T3, &T4) -> bool + Send + 'static,
{
    Box::new(FnHandler4 { f, _marker: PhantomData })
}

struct AnyHandler<F> {
    f: F,
}

impl<F> Handler for AnyHandler<F>
where
    F: FnMut(&DynValue) -> bool + Send,
{
    fn attempt(&mut self, payload: &DynValue) -> Result<MatchAttempt, ActorError> {
        Ok(MatchAttempt::Handled((self.f)(payload)))
    }
}

/// The wildcard handler: matches any message regardless of its shape.
pub fn on_any<F>(f: F) -> Box<dyn Handler>
where
    F: FnMut(&DynValue) -> bool + Send + 'static,
{
    Box::new(AnyHandler { f })
}

/// Like [`on_any`], but for a handler that always consumes.
pub fn on_any_always<F>(mut f: F) -> Box<dyn Handler>
where
    F: FnMut(&DynValue) + Send + 'static,
{
    on_any(move |v| {
        f(v);
        true
    })
}

/// Internal-only: used by `receive_only` as the fallback arm that raises
/// `MessageMismatch` for any message not matching the expected type.
pub(crate) struct MismatchHandler {
    pub(crate) expected: TypeId,
}

impl Handler for MismatchHandler {
    fn attempt(&mut self, _payload: &DynValue) -> Result<MatchAttempt, ActorError> {
        let _ = self.expected;
        Err(ActorError::MessageMismatch)
    }
}
