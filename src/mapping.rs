//! Declarative routing metadata.
//!
//! Controllers describe their routes with an explicit builder instead of
//! annotations: a class-level base path and permitted-caller list, plus one
//! [`RequestMapping`] per exposed handler method carrying its own path
//! fragment, optional permitted-caller list and formal parameter list.
//!
//! ```rust
//! use minimvc::container::Injectable;
//! use minimvc::dispatcher::Arguments;
//! use minimvc::mapping::{Controller, ControllerMapping, HandlerResult, Param, RequestMapping};
//!
//! struct UserController;
//! impl Injectable for UserController {}
//!
//! impl UserController {
//!     fn find(&self, args: &Arguments<'_>) -> HandlerResult {
//!         Ok(args.value(1).unwrap_or_default().into())
//!     }
//! }
//!
//! impl Controller for UserController {
//!     fn mapping() -> ControllerMapping<Self> {
//!         ControllerMapping::new().base_path("/users").method(
//!             RequestMapping::new("find", Self::find)
//!                 .path("/find")
//!                 .params([Param::Request, Param::named("id")]),
//!         )
//!     }
//! }
//! ```

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::container::Injectable;
use crate::dispatcher::Arguments;

/// Mapping key of the inbound request parameter (the type's simple name).
pub const REQUEST_MARKER: &str = "Request";
/// Mapping key of the outbound response parameter (the type's simple name).
pub const RESPONSE_MARKER: &str = "Response";

/// Handler methods return a JSON value (strings are written as plain text)
/// or a failure.
pub type HandlerResult = anyhow::Result<Value>;

/// A handler method of controller `C`.
pub type HandlerFn<C> = fn(&C, &Arguments<'_>) -> HandlerResult;

/// A handler method bound to its controller instance.
pub type BoundHandler = Arc<dyn Fn(&Arguments<'_>) -> HandlerResult + Send + Sync>;

/// One formal parameter of a handler method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Param {
    /// The live inbound request.
    Request,
    /// The live response writer.
    Response,
    /// A request parameter bound by name.
    Named(String),
}

impl Param {
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// Key under which this parameter appears in the index mapping.
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::Request => REQUEST_MARKER,
            Self::Response => RESPONSE_MARKER,
            Self::Named(name) => name,
        }
    }
}

/// Method-level routing metadata.
pub struct RequestMapping<C> {
    name: &'static str,
    path: String,
    security: Option<Vec<String>>,
    params: Vec<Param>,
    handler: HandlerFn<C>,
}

impl<C> RequestMapping<C> {
    #[must_use]
    pub fn new(name: &'static str, handler: HandlerFn<C>) -> Self {
        Self {
            name,
            path: String::new(),
            security: None,
            params: Vec::new(),
            handler,
        }
    }

    /// Path fragment appended to the controller's base path.
    #[must_use]
    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Permitted caller identities. Replaces the class-level list for this
    /// method.
    #[must_use]
    pub fn secured<I, S>(mut self, identities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.security = Some(identities.into_iter().map(Into::into).collect());
        self
    }

    /// Formal parameters in declared order.
    #[must_use]
    pub fn params(mut self, params: impl IntoIterator<Item = Param>) -> Self {
        self.params = params.into_iter().collect();
        self
    }
}

/// Class-level routing metadata plus the mapped methods, in declaration order.
pub struct ControllerMapping<C> {
    base_path: String,
    security: Option<Vec<String>>,
    methods: Vec<RequestMapping<C>>,
}

impl<C> Default for ControllerMapping<C> {
    fn default() -> Self {
        Self {
            base_path: String::new(),
            security: None,
            methods: Vec::new(),
        }
    }
}

impl<C: Send + Sync + 'static> ControllerMapping<C> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn base_path(mut self, path: impl Into<String>) -> Self {
        self.base_path = path.into();
        self
    }

    #[must_use]
    pub fn secured<I, S>(mut self, identities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.security = Some(identities.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn method(mut self, method: RequestMapping<C>) -> Self {
        self.methods.push(method);
        self
    }

    /// Erase the controller type by binding every handler to `instance`.
    #[must_use]
    pub fn bind(self, instance: Arc<C>) -> ControllerMeta {
        let methods = self
            .methods
            .into_iter()
            .map(|m| {
                let target = Arc::clone(&instance);
                let handler = m.handler;
                HandlerMethod {
                    name: m.name,
                    path: m.path,
                    security: m.security.map(Arc::from),
                    params: m.params,
                    invoke: bound(move |args| handler(&target, args)),
                }
            })
            .collect();
        ControllerMeta {
            type_name: std::any::type_name::<C>(),
            base_path: self.base_path,
            security: self.security.map(Arc::from),
            methods,
        }
    }
}

fn bound<F>(f: F) -> BoundHandler
where
    F: Fn(&Arguments<'_>) -> HandlerResult + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Implemented by components that expose handler methods.
pub trait Controller: Injectable + Sized {
    fn mapping() -> ControllerMapping<Self>;
}

/// Type-erased routing metadata of one registered controller.
pub struct ControllerMeta {
    type_name: &'static str,
    base_path: String,
    security: Option<Arc<[String]>>,
    methods: Vec<HandlerMethod>,
}

impl ControllerMeta {
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    #[must_use]
    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    #[must_use]
    pub fn security(&self) -> Option<&Arc<[String]>> {
        self.security.as_ref()
    }

    #[must_use]
    pub fn methods(&self) -> &[HandlerMethod] {
        &self.methods
    }
}

impl fmt::Debug for ControllerMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerMeta")
            .field("type_name", &self.type_name)
            .field("base_path", &self.base_path)
            .field("security", &self.security)
            .field("methods", &self.methods)
            .finish()
    }
}

/// A bound handler method with its metadata.
pub struct HandlerMethod {
    name: &'static str,
    path: String,
    security: Option<Arc<[String]>>,
    params: Vec<Param>,
    invoke: BoundHandler,
}

impl HandlerMethod {
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn security(&self) -> Option<&Arc<[String]>> {
        self.security.as_ref()
    }

    #[must_use]
    pub fn params(&self) -> &[Param] {
        &self.params
    }

    #[must_use]
    pub fn invoker(&self) -> &BoundHandler {
        &self.invoke
    }
}

impl fmt::Debug for HandlerMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerMethod")
            .field("name", &self.name)
            .field("path", &self.path)
            .field("security", &self.security)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// What interceptors see of the handler a request is routed to.
#[derive(Debug, Clone)]
pub struct HandlerInfo {
    pub controller: String,
    pub method: &'static str,
    pub pattern: String,
    pub method_security: Option<Arc<[String]>>,
    pub class_security: Option<Arc<[String]>>,
}

impl HandlerInfo {
    /// Effective permitted identities: the method-level list when present,
    /// otherwise the class-level one. Lists are never merged.
    #[must_use]
    pub fn permitted_identities(&self) -> Option<&[String]> {
        self.method_security
            .as_deref()
            .or(self.class_security.as_deref())
    }
}

impl fmt::Display for HandlerInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.controller, self.method)
    }
}
