//! # minimvc
//!
//! **minimvc** is a small request-dispatch framework: a component registry
//! with setter injection, a route table compiled from declarative controller
//! metadata, and an ordered interceptor chain around every handler call.
//!
//! ## Architecture
//!
//! - **[`container`]** - Named singleton components and dependency wiring
//! - **[`mapping`]** - Controller routing metadata (base path, method paths,
//!   permitted callers, formal parameters)
//! - **[`router`]** - Route table compilation and first-match lookup
//! - **[`interceptor`]** - Pre/post/cleanup hooks and the per-request chain
//! - **[`dispatcher`]** - Argument binding and handler invocation
//! - **[`server`]** - Request and response types at the transport boundary
//! - **[`catalog`]** / **[`context`]** - Component discovery and startup
//! - **[`config`]** / **[`logging`]** - Startup configuration and tracing setup
//!
//! ### Startup
//!
//! ```mermaid
//! sequenceDiagram
//!     participant App
//!     participant Ctx as ApplicationContext
//!     participant Cat as ComponentCatalog
//!     participant Reg as ComponentRegistry
//!     participant RT as RouteTable
//!
//!     App->>Ctx: bootstrap(&config, &catalog)
//!     Ctx->>Cat: scan(config.scan_package)
//!     Cat-->>Ctx: descriptors (catalog order)
//!     Ctx->>Ctx: instantiate each descriptor
//!     Ctx->>Reg: register(component)
//!     Ctx->>Reg: resolve_dependencies()
//!     alt missing dependency
//!         Reg-->>App: BootstrapError::Wiring
//!     end
//!     Ctx->>RT: compile(&registry, &interceptors)
//!     RT-->>Ctx: (table, per-route errors)
//!     Ctx-->>App: context
//! ```
//!
//! ### Request Handling
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Client
//!     participant D as Dispatcher
//!     participant RT as RouteTable
//!     participant C as HandlerExecutionChain
//!     participant H as Handler
//!
//!     Client->>D: dispatch(&request)
//!     D->>RT: find(path)
//!     alt no match
//!         D-->>Client: 404
//!     end
//!     D->>D: bind arguments by name
//!     D->>C: apply_pre_handle
//!     alt rejected
//!         C->>C: cleanup (reached interceptors, reversed)
//!         D-->>Client: response written by interceptor
//!     end
//!     D->>H: invoke(args)
//!     D->>C: apply_post_handle (reversed)
//!     D->>C: trigger_after_completion
//!     D-->>Client: response
//! ```
//!
//! ## Example
//!
//! ```rust
//! use minimvc::config::AppConfig;
//! use minimvc::context::ApplicationContext;
//! use minimvc::demo::demo_catalog;
//! use minimvc::server::Request;
//!
//! let config = AppConfig::new("app");
//! let context = ApplicationContext::bootstrap(&config, &demo_catalog()).unwrap();
//!
//! let response = context
//!     .dispatch(&Request::get("/demo/query?username=zhangsan&name=lisi"))
//!     .unwrap();
//! assert_eq!(response.status(), 200);
//! assert_eq!(response.body(), "lisi");
//! ```

pub mod catalog;
pub mod cli;
pub mod config;
pub mod container;
pub mod context;
pub mod demo;
pub mod dispatcher;
pub mod error;
pub mod ids;
pub mod interceptor;
pub mod logging;
pub mod mapping;
pub mod router;
pub mod server;

pub use catalog::{ComponentCatalog, ComponentDescriptor};
pub use config::AppConfig;
pub use container::{Autowired, ComponentRegistry, Injectable};
pub use context::ApplicationContext;
pub use dispatcher::Dispatcher;
pub use error::{BootstrapError, DispatchError};
pub use interceptor::{Interceptor, InterceptorRegistry, SecurityInterceptor};
pub use mapping::{Controller, ControllerMapping, Param, RequestMapping};
pub use router::RouteTable;
pub use server::{Request, Response};
