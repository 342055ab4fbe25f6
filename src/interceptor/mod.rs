//! # Interceptor Module
//!
//! Ordered, short-circuiting hooks around handler invocation.
//!
//! Every [`Interceptor`] registered in the [`InterceptorRegistry`] is attached
//! to every compiled route, in registration order. Per request a
//! [`HandlerExecutionChain`] drives the hooks:
//!
//! ```text
//! NotStarted -> PreRunning -> Rejected ------------------------> Cleanup
//!                          \-> PreComplete -> PostComplete ----> Cleanup
//! ```
//!
//! - pre-hooks run first to last and stop at the first `false`
//! - post-hooks run last to first, only after the handler succeeded
//! - cleanup hooks run last to first over the interceptors reached, exactly
//!   once per request, whatever the outcome

mod chain;
mod core;
mod security;
mod tracing;

pub(crate) use chain::panic_message;
pub use chain::{ChainState, HandlerExecutionChain};
pub use core::{Interceptor, InterceptorRegistry};
pub use security::{SecurityInterceptor, DEFAULT_IDENTITY_PARAM, REJECTION_MESSAGE};
pub use self::tracing::TracingInterceptor;
