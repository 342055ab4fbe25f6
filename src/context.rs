//! Application startup.
//!
//! [`ApplicationContext::bootstrap`] runs the startup pipeline once:
//!
//! ```text
//! scan -> instantiate -> register -> wire -> compile routes -> dispatcher
//! ```
//!
//! The context owns everything it built. Nothing is global, and nothing is
//! mutated after bootstrap returns, so the context can be shared across
//! request threads behind an `Arc`.

use std::sync::Arc;

use tracing::{info, warn};

use crate::catalog::{ComponentCatalog, Instance};
use crate::config::AppConfig;
use crate::container::ComponentRegistry;
use crate::dispatcher::Dispatcher;
use crate::error::{BootstrapError, DispatchError, RouteCompilationError};
use crate::interceptor::InterceptorRegistry;
use crate::router::RouteTable;
use crate::server::{Request, Response};

#[derive(Debug)]
pub struct ApplicationContext {
    config: AppConfig,
    registry: ComponentRegistry,
    interceptors: InterceptorRegistry,
    routes: Arc<RouteTable>,
    compile_errors: Vec<RouteCompilationError>,
    dispatcher: Dispatcher,
}

impl ApplicationContext {
    /// Build the context for `config.scan_package` out of `catalog`.
    ///
    /// A duplicate component name is logged and the later component skipped.
    /// A factory failure or an unresolvable dependency aborts startup. Routes
    /// that fail to compile are skipped and kept in
    /// [`compile_errors`](Self::compile_errors).
    pub fn bootstrap(
        config: &AppConfig,
        catalog: &ComponentCatalog,
    ) -> Result<Self, BootstrapError> {
        let scanned = catalog.scan(&config.scan_package);
        info!(
            scan_package = %config.scan_package,
            discovered = scanned.len(),
            catalog_size = catalog.len(),
            "Component scan complete"
        );

        let mut registry = ComponentRegistry::new();
        let mut interceptors = InterceptorRegistry::new();

        for descriptor in scanned {
            let instance = descriptor.instantiate(config).map_err(|e| {
                BootstrapError::Instantiation {
                    type_name: descriptor.type_name().to_string(),
                    reason: format!("{e:#}"),
                }
            })?;
            match instance {
                Instance::Components(components) => {
                    for component in components {
                        if let Err(e) = registry.register(component) {
                            warn!(
                                type_name = descriptor.type_name(),
                                error = %e,
                                "Component skipped"
                            );
                        }
                    }
                }
                Instance::Interceptor(interceptor) => interceptors.register_arc(interceptor),
            }
        }

        registry.resolve_dependencies()?;

        let (routes, compile_errors) = RouteTable::compile(&registry, &interceptors);
        let routes = Arc::new(routes);
        let dispatcher = Dispatcher::new(Arc::clone(&routes));

        info!(
            components = registry.len(),
            interceptors = interceptors.len(),
            routes = routes.len(),
            skipped_routes = compile_errors.len(),
            "Application context started"
        );

        Ok(Self {
            config: config.clone(),
            registry,
            interceptors,
            routes,
            compile_errors,
            dispatcher,
        })
    }

    pub fn dispatch(&self, request: &Request) -> Result<Response, DispatchError> {
        self.dispatcher.dispatch(request)
    }

    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    #[must_use]
    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    #[must_use]
    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    #[must_use]
    pub fn interceptors(&self) -> &InterceptorRegistry {
        &self.interceptors
    }

    #[must_use]
    pub fn compile_errors(&self) -> &[RouteCompilationError] {
        &self.compile_errors
    }

    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}
