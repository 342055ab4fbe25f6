//! Demo application used by the CLI, tests and benches.
//!
//! A secured controller under `/demo` delegating to a service it only knows
//! through its interface, plus the authorization interceptor.
//!
//! | Route            | Permitted callers             |
//! |------------------|-------------------------------|
//! | `/demo/query`    | `zhangsan` (controller list)  |
//! | `/demo/validate` | `wangwu` (method list wins)   |

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::catalog::{ComponentCatalog, ComponentDescriptor};
use crate::container::{Autowired, Dependency, Injectable, InjectionSlot};
use crate::dispatcher::Arguments;
use crate::interceptor::{SecurityInterceptor, TracingInterceptor};
use crate::mapping::{Controller, ControllerMapping, HandlerResult, Param, RequestMapping};

/// Scan root covering every demo component.
pub const DEMO_SCAN_PACKAGE: &str = "app";

pub const DEMO_CONTROLLER: &str = "app::demo::controller::DemoController";
pub const DEMO_SERVICE_IMPL: &str = "app::demo::service::DemoServiceImpl";
pub const DEMO_SERVICE: &str = "app::demo::service::DemoService";
pub const SECURITY_INTERCEPTOR: &str = "app::web::interceptor::SecurityInterceptor";
pub const TRACING_INTERCEPTOR: &str = "app::web::interceptor::TracingInterceptor";

pub trait DemoService: Send + Sync {
    fn get(&self, name: &str) -> String;
}

#[derive(Debug, Default)]
pub struct DemoServiceImpl;

impl DemoService for DemoServiceImpl {
    fn get(&self, name: &str) -> String {
        debug!(name, "DemoService::get");
        name.to_string()
    }
}

impl Injectable for DemoServiceImpl {}

fn as_demo_service(service: Arc<DemoServiceImpl>) -> Arc<dyn DemoService> {
    service
}

#[derive(Debug, Default)]
pub struct DemoController {
    demo_service: Autowired<dyn DemoService>,
}

impl DemoController {
    fn service(&self) -> anyhow::Result<&Arc<dyn DemoService>> {
        self.demo_service
            .get()
            .ok_or_else(|| anyhow::anyhow!("demo_service is not wired"))
    }

    fn query(&self, args: &Arguments<'_>) -> HandlerResult {
        let name = args.value(2).unwrap_or_default();
        Ok(Value::String(self.service()?.get(name)))
    }

    fn validate(&self, args: &Arguments<'_>) -> HandlerResult {
        let name = args.value(2).unwrap_or_default();
        Ok(Value::String(self.service()?.get(name)))
    }
}

impl Injectable for DemoController {
    fn dependencies(&self) -> Vec<Dependency> {
        vec![Dependency::new("demo_service", DEMO_SERVICE)]
    }

    fn slot(&self, field: &str) -> Option<&dyn InjectionSlot> {
        match field {
            "demo_service" => Some(&self.demo_service),
            _ => None,
        }
    }
}

impl Controller for DemoController {
    fn mapping() -> ControllerMapping<Self> {
        let params = || [Param::Request, Param::Response, Param::named("name")];
        ControllerMapping::new()
            .base_path("/demo")
            .secured(["zhangsan"])
            .method(
                RequestMapping::new("query", Self::query)
                    .path("/query")
                    .params(params()),
            )
            .method(
                RequestMapping::new("validate", Self::validate)
                    .path("/validate")
                    .secured(["wangwu"])
                    .params(params()),
            )
    }
}

/// Catalog of the demo application, in discovery order.
#[must_use]
pub fn demo_catalog() -> ComponentCatalog {
    ComponentCatalog::new()
        .with(ComponentDescriptor::controller(DEMO_CONTROLLER, |_| {
            Ok(DemoController::default())
        }))
        .with(
            ComponentDescriptor::service(DEMO_SERVICE_IMPL, |_| Ok(DemoServiceImpl))
                .exposes(DEMO_SERVICE, as_demo_service),
        )
        .with(ComponentDescriptor::interceptor(SECURITY_INTERCEPTOR, |config| {
            Ok(SecurityInterceptor::new().with_identity_param(config.identity_param.clone()))
        }))
        .with(ComponentDescriptor::interceptor(TRACING_INTERCEPTOR, |_| {
            Ok(TracingInterceptor)
        }))
}
