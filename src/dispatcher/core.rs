use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, error, info};

use super::args::{Arg, Arguments};
use crate::error::DispatchError;
use crate::ids::RequestId;
use crate::interceptor::{panic_message, HandlerExecutionChain};
use crate::router::{Route, RouteTable};
use crate::server::{Request, Response};

/// How a dispatch that reached a route ended.
enum Completion {
    /// A pre-hook said no; cleanup already ran inside the chain.
    Rejected,
    /// Handler and post-hooks succeeded.
    Handled,
}

/// Matches requests against the route table and drives the interceptor
/// chain around the bound handler.
///
/// The dispatcher only reads shared state; every per-request value (the
/// chain, the argument array, the response) lives on the dispatching thread.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    routes: Arc<RouteTable>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(routes: Arc<RouteTable>) -> Self {
        Self { routes }
    }

    #[must_use]
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Dispatch one request.
    ///
    /// - no matching route: `404` with a plain-text body, no hooks run
    /// - rejected by a pre-hook: whatever the interceptor wrote
    /// - handler (or a pre/post hook) failed or panicked: the failure is
    ///   logged, cleanup runs with it, and the client gets a generic `500`
    ///
    /// Failing or panicking cleanup hooks are logged and discarded. `Err` is
    /// returned only when the cleanup phase itself breaks down.
    pub fn dispatch(&self, request: &Request) -> Result<Response, DispatchError> {
        let request_id = RequestId::from_header_or_new(request.header("x-request-id"));

        let Some(route) = self.routes.find(request.path()) else {
            info!(
                request_id = %request_id,
                method = %request.method(),
                path = %request.path(),
                "No route matched"
            );
            return Ok(Response::not_found());
        };

        debug!(
            request_id = %request_id,
            path = %request.path(),
            pattern = %route.pattern(),
            handler = %route.handler(),
            "Route matched"
        );

        let start = Instant::now();
        let response = Response::new();
        let mut chain = HandlerExecutionChain::new(route.handler(), route.interceptors());

        let outcome = {
            let args = bind_arguments(route, request, &response);
            catch_unwind(AssertUnwindSafe(|| {
                run(&mut chain, route, request, &response, &args)
            }))
            .unwrap_or_else(|payload| {
                Err(anyhow::anyhow!(
                    "handler panicked: {}",
                    panic_message(payload.as_ref())
                ))
            })
        };

        match outcome {
            Ok(Completion::Rejected) => {
                info!(
                    request_id = %request_id,
                    handler = %route.handler(),
                    status = response.status().as_u16(),
                    "Request rejected by interceptor"
                );
                // cleanup ran inside apply_pre_handle; this only replays its outcome
                chain
                    .trigger_after_completion(request, &response, None)
                    .map_err(|e| fatal(request, &e))?;
                Ok(response)
            }
            Ok(Completion::Handled) => {
                chain
                    .trigger_after_completion(request, &response, None)
                    .map_err(|e| fatal(request, &e))?;
                info!(
                    request_id = %request_id,
                    handler = %route.handler(),
                    status = response.status().as_u16(),
                    latency_us = u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX),
                    "Request handled"
                );
                Ok(response)
            }
            Err(failure) => {
                error!(
                    request_id = %request_id,
                    handler = %route.handler(),
                    path = %request.path(),
                    error = %failure,
                    error_chain = ?failure,
                    "Handler invocation failed"
                );
                chain
                    .trigger_after_completion(request, &response, Some(&failure))
                    .map_err(|e| fatal(request, &e))?;
                Ok(Response::internal_error())
            }
        }
    }
}

fn run(
    chain: &mut HandlerExecutionChain<'_>,
    route: &Route,
    request: &Request,
    response: &Response,
    args: &Arguments<'_>,
) -> anyhow::Result<Completion> {
    if !chain.apply_pre_handle(request, response)? {
        return Ok(Completion::Rejected);
    }
    let result = route.invoke(args)?;
    chain.apply_post_handle(request, response, &result)?;
    if !response.is_committed() {
        response.write_value(&result);
    }
    Ok(Completion::Handled)
}

fn fatal(request: &Request, cause: &dyn std::fmt::Display) -> DispatchError {
    error!(path = %request.path(), error = %cause, "Cleanup phase failed, escalating");
    DispatchError::Fatal {
        path: request.path().to_string(),
        reason: cause.to_string(),
    }
}

/// Build the handler's argument array.
///
/// Request parameters are placed by name (multiple values joined with `,`).
/// The live request and response are placed afterwards at their marker
/// indices, so they win over a user parameter with the same key.
#[must_use]
pub fn bind_arguments<'a>(
    route: &Route,
    request: &'a Request,
    response: &'a Response,
) -> Arguments<'a> {
    let mapping = route.param_mapping();
    let mut args = Arguments::with_len(mapping.arity());

    for (key, values) in request.params() {
        let Some(index) = mapping.get(key) else {
            continue;
        };
        match values {
            [single] => args.set(index, Arg::Value(single)),
            many => args.set_owned(index, many.join(",")),
        }
    }

    if let Some(index) = mapping.request_index() {
        args.set(index, Arg::Request(request));
    }
    if let Some(index) = mapping.response_index() {
        args.set(index, Arg::Response(response));
    }
    args
}
