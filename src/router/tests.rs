use std::sync::Arc;

use serde_json::Value;

use super::{ParamIndexMapping, RouteTable};
use crate::container::{Component, ComponentRegistry, Injectable};
use crate::dispatcher::Arguments;
use crate::error::RouteCompilationError;
use crate::interceptor::{InterceptorRegistry, SecurityInterceptor, TracingInterceptor};
use crate::mapping::{Controller, ControllerMapping, HandlerResult, Param, RequestMapping};

struct Items;
impl Injectable for Items {}

impl Items {
    fn list(&self, _: &Arguments<'_>) -> HandlerResult {
        Ok(Value::from("list"))
    }

    fn by_id(&self, args: &Arguments<'_>) -> HandlerResult {
        Ok(Value::from(args.value(0).unwrap_or_default()))
    }

    fn shadowed(&self, _: &Arguments<'_>) -> HandlerResult {
        Ok(Value::from("shadowed"))
    }
}

impl Controller for Items {
    fn mapping() -> ControllerMapping<Self> {
        ControllerMapping::new()
            .base_path("/items")
            .method(RequestMapping::new("list", Self::list).path("/list"))
            .method(
                RequestMapping::new("by_id", Self::by_id)
                    .path(r"/\d+")
                    .params([Param::named("id")]),
            )
            .method(RequestMapping::new("shadowed", Self::shadowed).path("/list"))
    }
}

struct Broken;
impl Injectable for Broken {}

impl Broken {
    fn handle(&self, _: &Arguments<'_>) -> HandlerResult {
        Ok(Value::Null)
    }
}

impl Controller for Broken {
    fn mapping() -> ControllerMapping<Self> {
        ControllerMapping::new()
            .base_path("/broken")
            .method(RequestMapping::new("bad_pattern", Self::handle).path("/(unclosed"))
            .method(
                RequestMapping::new("duplicate_name", Self::handle)
                    .path("/dup")
                    .params([Param::named("id"), Param::named("id")]),
            )
            .method(
                RequestMapping::new("marker_collision", Self::handle)
                    .path("/collide")
                    .params([Param::Request, Param::named("Request")]),
            )
            .method(
                RequestMapping::new("fine", Self::handle)
                    .path("/fine")
                    .params([Param::Request, Param::Response, Param::named("name")]),
            )
    }
}

fn registry_with(components: Vec<Component>) -> ComponentRegistry {
    let mut registry = ComponentRegistry::new();
    for c in components {
        registry.register(c).unwrap();
    }
    registry.resolve_dependencies().unwrap();
    registry
}

fn compile(components: Vec<Component>) -> (RouteTable, Vec<RouteCompilationError>) {
    RouteTable::compile(&registry_with(components), &InterceptorRegistry::new())
}

#[test]
fn test_routes_compile_in_declaration_order() {
    let (table, errors) = compile(vec![Component::controller("items", Arc::new(Items))]);
    assert!(errors.is_empty());
    let patterns: Vec<&str> = table.iter().map(|r| r.pattern()).collect();
    assert_eq!(patterns, ["/items/list", r"/items/\d+", "/items/list"]);
}

#[test]
fn test_first_match_wins_for_identical_patterns() {
    let (table, _) = compile(vec![Component::controller("items", Arc::new(Items))]);
    let route = table.find("/items/list").unwrap();
    assert_eq!(route.handler().method, "list");
    assert_eq!(route.handler().to_string(), "items::list");
}

#[test]
fn test_match_is_full_string() {
    let (table, _) = compile(vec![Component::controller("items", Arc::new(Items))]);
    assert!(table.find("/items/list/extra").is_none());
    assert!(table.find("/prefix/items/list").is_none());
    assert!(table.find("/items/abc").is_none());
    assert_eq!(table.find("/items/42").unwrap().handler().method, "by_id");
}

#[test]
fn test_failing_routes_are_skipped_and_reported() {
    let (table, errors) = compile(vec![
        Component::controller("broken", Arc::new(Broken)),
        Component::controller("items", Arc::new(Items)),
    ]);

    assert_eq!(errors.len(), 3);
    assert!(matches!(
        &errors[0],
        RouteCompilationError::InvalidPattern { method, pattern, .. }
            if method == "bad_pattern" && pattern == "/broken/(unclosed"
    ));
    assert!(matches!(
        &errors[1],
        RouteCompilationError::AmbiguousSignature { key, first: 0, second: 1, .. }
            if key == "id"
    ));
    assert!(matches!(
        &errors[2],
        RouteCompilationError::AmbiguousSignature { key, .. } if key == "Request"
    ));
    assert_eq!(errors[2].handler(), "broken::marker_collision");

    // the rest still compiled
    assert_eq!(table.len(), 4);
    assert!(table.find("/broken/fine").is_some());
    assert!(table.find("/items/7").is_some());
}

#[test]
fn test_param_mapping_of_compiled_route() {
    let (table, _) = compile(vec![Component::controller("broken", Arc::new(Broken))]);
    let mapping = table.find("/broken/fine").unwrap().param_mapping();
    assert_eq!(mapping.arity(), 3);
    assert_eq!(mapping.request_index(), Some(0));
    assert_eq!(mapping.response_index(), Some(1));
    assert_eq!(mapping.get("name"), Some(2));
    assert_eq!(mapping.get("missing"), None);
}

#[test]
fn test_every_route_gets_all_interceptors_in_order() {
    let mut interceptors = InterceptorRegistry::new();
    interceptors.register(SecurityInterceptor::new());
    interceptors.register(TracingInterceptor);
    let registry = registry_with(vec![Component::controller("items", Arc::new(Items))]);

    let (table, _) = RouteTable::compile(&registry, &interceptors);
    for route in table.iter() {
        let names: Vec<&str> = route.interceptors().iter().map(|i| i.name()).collect();
        assert_eq!(names, ["SecurityInterceptor", "TracingInterceptor"]);
    }
}

#[test]
fn test_non_controllers_contribute_no_routes() {
    struct Plain;
    impl Injectable for Plain {}
    let (table, errors) = compile(vec![Component::new("plain", Arc::new(Plain))]);
    assert!(table.is_empty());
    assert!(errors.is_empty());
}

#[test]
fn test_compiled_route_invokes_bound_handler() {
    let (table, _) = compile(vec![Component::controller("items", Arc::new(Items))]);
    let route = table.find("/items/9").unwrap();
    let mut args = Arguments::with_len(route.param_mapping().arity());
    args.set_owned(0, "9".to_string());
    assert_eq!(route.invoke(&args).unwrap(), Value::from("9"));
}

#[test]
fn test_param_index_mapping_overwrites_duplicates() {
    let mapping = ParamIndexMapping::from_params(&[
        Param::named("a"),
        Param::named("b"),
        Param::named("a"),
    ]);
    assert_eq!(mapping.arity(), 3);
    assert_eq!(mapping.len(), 2);
    assert_eq!(mapping.get("a"), Some(2));

    let mut mapping = ParamIndexMapping::with_arity(1);
    assert_eq!(mapping.insert("x", 0), None);
    assert_eq!(mapping.insert("x", 1), Some(0));
}
