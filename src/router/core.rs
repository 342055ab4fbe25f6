use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use regex::Regex;
use tracing::{debug, info, warn};

use crate::container::ComponentRegistry;
use crate::dispatcher::Arguments;
use crate::error::RouteCompilationError;
use crate::interceptor::{Interceptor, InterceptorRegistry};
use crate::mapping::{
    BoundHandler, ControllerMeta, HandlerInfo, HandlerMethod, HandlerResult, Param,
    REQUEST_MARKER, RESPONSE_MARKER,
};

/// Mapping from parameter key to positional index in a handler's argument
/// list.
///
/// The key space is flat: request/response markers ([`REQUEST_MARKER`],
/// [`RESPONSE_MARKER`]) share it with user parameter names, and a second
/// insert under the same key overwrites the first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamIndexMapping {
    entries: HashMap<String, usize>,
    arity: usize,
}

impl ParamIndexMapping {
    /// Build the mapping for a parameter list with overwrite-on-duplicate
    /// semantics.
    #[must_use]
    pub fn from_params(params: &[Param]) -> Self {
        let mut mapping = Self::with_arity(params.len());
        for (index, param) in params.iter().enumerate() {
            let _previous = mapping.insert(param.key(), index);
        }
        mapping
    }

    #[must_use]
    pub fn with_arity(arity: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(arity),
            arity,
        }
    }

    /// Insert `key → index`, returning the index it replaced.
    pub fn insert(&mut self, key: &str, index: usize) -> Option<usize> {
        self.entries.insert(key.to_string(), index)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<usize> {
        self.entries.get(key).copied()
    }

    #[must_use]
    pub fn request_index(&self) -> Option<usize> {
        self.get(REQUEST_MARKER)
    }

    #[must_use]
    pub fn response_index(&self) -> Option<usize> {
        self.get(RESPONSE_MARKER)
    }

    /// Number of formal parameters; the argument array has this length.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.arity
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A compiled URL pattern bound to one handler method.
pub struct Route {
    pattern: String,
    matcher: Regex,
    handler: HandlerInfo,
    param_mapping: ParamIndexMapping,
    interceptors: Arc<[Arc<dyn Interceptor>]>,
    invoke: BoundHandler,
}

impl Route {
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Full-string match of `path` against the pattern.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        self.matcher.is_match(path)
    }

    #[must_use]
    pub fn handler(&self) -> &HandlerInfo {
        &self.handler
    }

    #[must_use]
    pub fn param_mapping(&self) -> &ParamIndexMapping {
        &self.param_mapping
    }

    /// Interceptors attached to this route, in registration order.
    #[must_use]
    pub fn interceptors(&self) -> &[Arc<dyn Interceptor>] {
        &self.interceptors
    }

    /// Call the bound handler method.
    pub fn invoke(&self, args: &Arguments<'_>) -> HandlerResult {
        (self.invoke)(args)
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("pattern", &self.pattern)
            .field("handler", &self.handler.to_string())
            .field("param_mapping", &self.param_mapping)
            .field("interceptors", &self.interceptors.len())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.pattern, self.handler)
    }
}

/// Ordered route table. Lookup is first match wins, in compile order.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    /// Compile the routes of every controller in `registry`.
    ///
    /// Controllers are visited in registration order and their methods in
    /// declaration order; that order becomes the match priority. A route
    /// that fails to compile is reported and skipped, the rest still compile.
    /// Every route gets the full current interceptor set.
    #[must_use]
    pub fn compile(
        registry: &ComponentRegistry,
        interceptors: &InterceptorRegistry,
    ) -> (Self, Vec<RouteCompilationError>) {
        let chain = interceptors.snapshot();
        let mut routes = Vec::new();
        let mut errors = Vec::new();

        for component in registry.components() {
            let Some(meta) = component.controller_meta() else {
                continue;
            };
            for method in meta.methods() {
                match compile_route(component.name(), meta, method, &chain) {
                    Ok(route) => {
                        debug!(
                            pattern = %route.pattern,
                            handler = %route.handler,
                            params = route.param_mapping.arity(),
                            "Route compiled"
                        );
                        routes.push(route);
                    }
                    Err(e) => {
                        warn!(handler = %e.handler(), error = %e, "Route skipped");
                        errors.push(e);
                    }
                }
            }
        }

        let routes_summary: Vec<String> = routes.iter().take(10).map(ToString::to_string).collect();
        info!(
            routes_count = routes.len(),
            skipped = errors.len(),
            interceptors = chain.len(),
            routes_summary = ?routes_summary,
            "Routing table loaded"
        );

        (Self { routes }, errors)
    }

    /// First route whose pattern fully matches `path`.
    #[must_use]
    pub fn find(&self, path: &str) -> Option<&Route> {
        self.routes.iter().find(|r| r.matches(path))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

fn compile_route(
    controller: &str,
    meta: &ControllerMeta,
    method: &HandlerMethod,
    interceptors: &Arc<[Arc<dyn Interceptor>]>,
) -> Result<Route, RouteCompilationError> {
    let pattern = format!("{}{}", meta.base_path(), method.path());

    let matcher = Regex::new(&format!("^(?:{pattern})$")).map_err(|e| {
        RouteCompilationError::InvalidPattern {
            controller: controller.to_string(),
            method: method.name().to_string(),
            pattern: pattern.clone(),
            reason: e.to_string(),
        }
    })?;

    let mut param_mapping = ParamIndexMapping::with_arity(method.params().len());
    for (index, param) in method.params().iter().enumerate() {
        if let Some(first) = param_mapping.insert(param.key(), index) {
            return Err(RouteCompilationError::AmbiguousSignature {
                controller: controller.to_string(),
                method: method.name().to_string(),
                key: param.key().to_string(),
                first,
                second: index,
            });
        }
    }

    Ok(Route {
        handler: HandlerInfo {
            controller: controller.to_string(),
            method: method.name(),
            pattern: pattern.clone(),
            method_security: method.security().map(Arc::clone),
            class_security: meta.security().map(Arc::clone),
        },
        pattern,
        matcher,
        param_mapping,
        interceptors: Arc::clone(interceptors),
        invoke: Arc::clone(method.invoker()),
    })
}
