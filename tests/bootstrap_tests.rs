//! Startup tests against the demo application
//!
//! - scan → instantiate → register → wire → compile
//! - controller-level and method-level caller lists
//! - fatal wiring and factory failures
//! - scan root filtering

use std::sync::Arc;

use http::StatusCode;
use minimvc::catalog::{ComponentCatalog, ComponentDescriptor};
use minimvc::config::AppConfig;
use minimvc::container::Injectable;
use minimvc::context::ApplicationContext;
use minimvc::demo::{
    demo_catalog, DemoController, DemoService, DemoServiceImpl, DEMO_CONTROLLER, DEMO_SERVICE,
};
use minimvc::error::{BootstrapError, ContainerError};
use minimvc::server::Request;

use tracing_util::TestTracing;

fn demo_context() -> ApplicationContext {
    ApplicationContext::bootstrap(&AppConfig::new("app"), &demo_catalog()).unwrap()
}

#[test]
fn test_demo_context_registers_and_wires_everything() {
    let _tracing = TestTracing::init();
    let context = demo_context();

    let registry = context.registry();
    assert!(registry.is_wired());
    assert!(registry.lookup("demoController").is_some());
    assert!(registry.lookup("demoServiceImpl").is_some());
    assert!(registry.get::<dyn DemoService>(DEMO_SERVICE).is_some());
    assert!(registry.get::<DemoController>("demoController").is_some());

    let names: Vec<&str> = context.interceptors().iter().map(|i| i.name()).collect();
    assert_eq!(names, ["SecurityInterceptor", "TracingInterceptor"]);
    assert_eq!(context.routes().len(), 2);
    assert!(context.compile_errors().is_empty());
}

#[test]
fn test_controller_level_caller_list() {
    let context = demo_context();

    let res = context
        .dispatch(&Request::get("/demo/query?username=zhangsan&name=lisi"))
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.body(), "lisi");

    let res = context
        .dispatch(&Request::get("/demo/query?username=lisi&name=lisi"))
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(res.body(), "No Access Permission");
}

#[test]
fn test_method_level_list_overrides_controller_list() {
    let context = demo_context();

    let res = context
        .dispatch(&Request::get("/demo/validate?username=zhangsan&name=x"))
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = context
        .dispatch(&Request::get("/demo/validate?username=wangwu&name=x"))
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.body(), "x");
}

#[test]
fn test_identity_param_comes_from_config() {
    let mut config = AppConfig::new("app");
    config.identity_param = "user".to_string();
    let context = ApplicationContext::bootstrap(&config, &demo_catalog()).unwrap();

    let res = context
        .dispatch(&Request::get("/demo/query?user=zhangsan&name=n"))
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = context
        .dispatch(&Request::get("/demo/query?username=zhangsan&name=n"))
        .unwrap();
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[test]
fn test_missing_dependency_aborts_startup() {
    // the controller alone: its service dependency is not in the catalog
    let catalog = ComponentCatalog::new().with(ComponentDescriptor::controller(
        DEMO_CONTROLLER,
        |_| Ok(DemoController::default()),
    ));

    let err = ApplicationContext::bootstrap(&AppConfig::new("app"), &catalog).unwrap_err();
    match err {
        BootstrapError::Wiring(ContainerError::UnresolvedDependency {
            component,
            field,
            target,
        }) => {
            assert_eq!(component, "demoController");
            assert_eq!(field, "demo_service");
            assert_eq!(target, DEMO_SERVICE);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_scan_root_limits_discovery() {
    // only the service package is scanned, so the controller and its routes
    // are absent
    let context =
        ApplicationContext::bootstrap(&AppConfig::new("app.demo.service"), &demo_catalog())
            .unwrap();
    assert!(context.routes().is_empty());
    assert!(context.interceptors().is_empty());
    assert_eq!(context.registry().len(), 2);

    let res = context.dispatch(&Request::get("/demo/query")).unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[test]
fn test_duplicate_name_keeps_first_component() {
    struct Other;
    impl Injectable for Other {}

    let catalog = demo_catalog().with(
        ComponentDescriptor::service("app::extra::Other", |_| Ok(Other)).named("demoServiceImpl"),
    );
    let context = ApplicationContext::bootstrap(&AppConfig::new("app"), &catalog).unwrap();

    let first = context.registry().lookup("demoServiceImpl").unwrap();
    assert_eq!(first.type_name(), std::any::type_name::<DemoServiceImpl>());
    assert_eq!(context.registry().len(), 3);
}

#[test]
fn test_factory_failure_aborts_startup() {
    struct Failing;
    impl Injectable for Failing {}

    let catalog = ComponentCatalog::new().with(ComponentDescriptor::service(
        "app::broken::Failing",
        |_| -> anyhow::Result<Failing> { anyhow::bail!("no connection") },
    ));
    let err = ApplicationContext::bootstrap(&AppConfig::new("app"), &catalog).unwrap_err();
    assert!(matches!(
        err,
        BootstrapError::Instantiation { ref type_name, ref reason }
            if type_name == "app::broken::Failing" && reason.contains("no connection")
    ));
}

#[test]
fn test_context_is_shareable_across_threads() {
    let context = Arc::new(demo_context());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let context = Arc::clone(&context);
            std::thread::spawn(move || {
                let uri = format!("/demo/query?username=zhangsan&name=n{i}");
                context.dispatch(&Request::get(&uri)).unwrap().body()
            })
        })
        .collect();
    let mut bodies: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    bodies.sort();
    assert_eq!(bodies, ["n0", "n1", "n2", "n3"]);
}
