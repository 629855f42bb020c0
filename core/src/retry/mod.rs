//! Bounded retry around a single executor invocation.

mod controller;
mod policy;

pub use controller::{RetryController, CANCELLED_NOTE};
pub use policy::{RetryPolicy, RetryStrategy};
