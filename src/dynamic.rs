//! Type-erased message payloads.
//!
//! A [`DynValue`] records the static type it was built from as a [`TypeId`] and
//! carries the value behind `Box<dyn Any + Send>`. Two values "convert to" the same
//! type iff they were built from that exact static type; there is no numeric
//! widening or subtyping across tuple shapes: `(i32, i32)` and `(i64, i32)` are
//! distinct shapes even though both are "a pair of numbers".

use std::any::{Any, TypeId};
use std::fmt;

/// Wire shape of a `send2` call, distinct from a bare `(T1, T2)` tuple so that
/// `send2(h, a, b)` and `send(h, (a, b))` produce different `DynValue` types: the
/// former matches only [`crate::on2`], the latter only a handler over `(T1, T2)`.
pub(crate) struct Args2<T1, T2>(pub(crate) T1, pub(crate) T2);

/// Wire shape of a `send3` call; see [`Args2`].
pub(crate) struct Args3<T1, T2, T3>(pub(crate) T1, pub(crate) T2, pub(crate) T3);

/// Wire shape of a `send4` call; see [`Args2`].
pub(crate) struct Args4<T1, T2, T3, T4>(pub(crate) T1, pub(crate) T2, pub(crate) T3, pub(crate) T4);

/// A type-erased, `Send`-only payload.
pub struct DynValue {
    type_id: TypeId,
    type_name: &'static str,
    value: Box<dyn Any + Send>,
}

impl DynValue {
    /// Erases `value`, recording its static type.
    pub fn new<T: Send + 'static>(value: T) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
            value: Box::new(value),
        }
    }

    /// True iff this value was built from exactly `T`.
    pub fn converts_to<T: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    /// Borrow the value as `T`, or `None` if `converts_to::<T>()` is false.
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.value.downcast_ref::<T>()
    }

    /// Extract the value as `T`. Panics if `converts_to::<T>()` was false; callers
    /// are expected to have checked first, as with [`DynValue::downcast_ref`].
    pub fn get<T: Send + 'static>(self) -> T {
        match self.value.downcast::<T>() {
            Ok(boxed) => *boxed,
            Err(_) => panic!(
                "DynValue::get::<{}>() called on a value of type {}",
                std::any::type_name::<T>(),
                self.type_name
            ),
        }
    }

    /// The name of the static type this value was built from, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl fmt::Debug for DynValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynValue").field("type", &self.type_name).finish()
    }
}
