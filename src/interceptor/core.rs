use std::sync::Arc;

use serde_json::Value;
use tracing::info;

use crate::mapping::HandlerInfo;
use crate::server::{Request, Response};

/// Hooks run around every dispatched handler.
///
/// All hooks have permissive defaults so an interceptor only implements what
/// it needs. Implementations must be stateless per invocation: one instance
/// serves every route and every concurrent request.
pub trait Interceptor: Send + Sync {
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Return `Ok(false)` to reject the request. A rejecting interceptor is
    /// expected to have written its own response.
    fn pre_handle(
        &self,
        _req: &Request,
        _res: &Response,
        _handler: &HandlerInfo,
    ) -> anyhow::Result<bool> {
        Ok(true)
    }

    /// Runs after a successful handler call, in reverse registration order.
    fn post_handle(
        &self,
        _req: &Request,
        _res: &Response,
        _handler: &HandlerInfo,
        _result: &Value,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    /// Runs exactly once per request for every interceptor whose pre-hook was
    /// reached, in reverse order. Failures here are logged and discarded.
    fn after_completion(
        &self,
        _req: &Request,
        _res: &Response,
        _handler: &HandlerInfo,
        _failure: Option<&anyhow::Error>,
    ) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Globally registered interceptors, in registration order.
#[derive(Default, Clone)]
pub struct InterceptorRegistry {
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl InterceptorRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<I: Interceptor + 'static>(&mut self, interceptor: I) {
        self.register_arc(Arc::new(interceptor));
    }

    pub fn register_arc(&mut self, interceptor: Arc<dyn Interceptor>) {
        info!(
            interceptor = interceptor.name(),
            position = self.interceptors.len(),
            "Interceptor registered"
        );
        self.interceptors.push(interceptor);
    }

    /// Immutable copy of the current list, shared by every compiled route.
    #[must_use]
    pub fn snapshot(&self) -> Arc<[Arc<dyn Interceptor>]> {
        self.interceptors.iter().map(Arc::clone).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Interceptor>> {
        self.interceptors.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }
}

impl std::fmt::Debug for InterceptorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.interceptors.iter().map(|i| i.name()))
            .finish()
    }
}
