//! # Container Module
//!
//! Named singleton components and setter-style dependency injection.
//!
//! ## Lifecycle
//!
//! 1. Every component is constructed and [`register`](ComponentRegistry::register)ed
//!    under a unique name.
//! 2. [`resolve_dependencies`](ComponentRegistry::resolve_dependencies) walks the
//!    declared [`Dependency`] edges once, checks every target against the
//!    owner's [`InjectionSlot`] and then binds them all. A missing or mistyped
//!    target aborts startup with nothing bound.
//! 3. The registry is read-only from then on.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use minimvc::container::{
//!     Autowired, Component, ComponentRegistry, Dependency, Injectable, InjectionSlot,
//! };
//!
//! struct Repo;
//! impl Injectable for Repo {}
//!
//! struct Service {
//!     repo: Autowired<Repo>,
//! }
//!
//! impl Injectable for Service {
//!     fn dependencies(&self) -> Vec<Dependency> {
//!         vec![Dependency::new("repo", "repo")]
//!     }
//!
//!     fn slot(&self, field: &str) -> Option<&dyn InjectionSlot> {
//!         match field {
//!             "repo" => Some(&self.repo),
//!             _ => None,
//!         }
//!     }
//! }
//!
//! let service = Arc::new(Service { repo: Autowired::new() });
//! let mut registry = ComponentRegistry::new();
//! registry.register(Component::new("repo", Arc::new(Repo))).unwrap();
//! registry.register(Component::new("service", Arc::clone(&service))).unwrap();
//! registry.resolve_dependencies().unwrap();
//! assert!(service.repo.is_wired());
//! ```

mod core;

pub use core::{
    Autowired, Component, ComponentRef, ComponentRegistry, Dependency, Injectable,
    InjectionSlot,
};
