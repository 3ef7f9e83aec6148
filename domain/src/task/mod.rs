//! Task lifecycle domain.
//!
//! A [`entities::Task`] is one asynchronous execution of a stage. Its status
//! only moves forward through [`entities::Task::apply`]:
//!
//! ```text
//! pending ──Start──▶ running ──Complete──▶ completed
//!                       │
//!                       └──────Fail──────▶ failed
//! ```
//!
//! Every accepted event yields the [`events::ProgressEvent`] that observers
//! receive; every rejected event yields a [`error::TransitionError`] and
//! leaves the task untouched.

pub mod entities;
pub mod error;
pub mod events;
