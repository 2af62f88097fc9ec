//! An in-process actor-style messaging core.
//!
//! Independently scheduled execution contexts ("actors") exchange heterogeneous
//! typed messages through per-actor mailboxes. Termination propagates across
//! parent/child ("owner") and symmetric ("link") relationships as synthesized
//! `LinkDead` control messages, surfaced to the consuming actor's next `receive` as
//! [`ActorError::OwnerTerminated`]/[`ActorError::LinkTerminated`].
//!
//! ```no_run
//! use actorcore::{receive_only, receive_only2, send2, spawn, this_id};
//!
//! let parent_task = spawn(move || {
//!     let parent = this_id();
//!     let child = spawn(move || {
//!         receive_only2::<i32, i32>()
//!             .map(|(a, b)| a + b)
//!             .and_then(|sum| actorcore::send(&parent, sum))
//!             .unwrap();
//!     });
//!     send2(&child, 40i32, 2i32).unwrap();
//!     let sum: i32 = receive_only().unwrap();
//!     assert_eq!(sum, 42);
//! });
//! drop(parent_task);
//! ```

mod context;
mod dynamic;
mod error;
mod handle;
mod handler;
mod mailbox;
mod message;
mod receive;
mod send;
mod spawn;

pub use context::this_id;
pub use dynamic::DynValue;
pub use error::ActorError;
pub use handle::{ActorId, CapacityPolicy, Handle};
pub use handler::{on1, on1_always, on2, on2_always, on3, on4, on_any, on_any_always, Handler};
pub use receive::{receive, receive_only, receive_only2, receive_only3, receive_only4, receive_timeout};
pub use send::{send, send2, send3, send4, set_capacity};
pub use spawn::{spawn, spawn_linked};
