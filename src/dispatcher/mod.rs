//! # Dispatcher Module
//!
//! Per-request flow:
//!
//! 1. **Match**: first route in the table whose pattern fully matches the
//!    request path. No match is a normal `404` outcome.
//! 2. **Bind**: an argument array sized to the handler's parameter count is
//!    filled from request parameters by name; the live request and response
//!    are then placed at their marker positions.
//! 3. **Invoke**: pre-hooks → handler → post-hooks → cleanup. A rejection
//!    stops after the pre-hooks; a failure (error or panic) skips to cleanup
//!    with the failure and yields a generic `500`.
//!
//! ## Error Handling
//!
//! - Failure details go to the log, never to the response body
//! - Only a failure of the cleanup phase itself is returned as
//!   [`DispatchError`](crate::error::DispatchError)
//!
//! ## Concurrency
//!
//! [`Dispatcher`] is `Clone + Send + Sync` and holds only shared read-only
//! state. Nothing in a dispatch blocks except the handler and the hooks; no
//! timeout is imposed on either.

mod args;
mod core;

pub use args::{Arg, Arguments, MAX_INLINE_ARGS};
pub use core::{bind_arguments, Dispatcher};
