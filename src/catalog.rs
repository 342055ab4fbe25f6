//! Component discovery.
//!
//! The embedding application lists its components in a [`ComponentCatalog`]:
//! one [`ComponentDescriptor`] per type, carrying the fully qualified type
//! path, the component kind and a factory. Startup picks the descriptors
//! under the configured scan root and instantiates them in catalog order.
//!
//! ## Naming
//!
//! | Kind        | Registered as                                             |
//! |-------------|-----------------------------------------------------------|
//! | Controller  | lower-first simple type name (`DemoController` → `demoController`) |
//! | Service     | explicit name, else lower-first simple name; plus one alias per exposed interface path |
//! | Interceptor | not named; appended to the interceptor chain              |

use std::fmt;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::container::{Component, Injectable};
use crate::interceptor::Interceptor;
use crate::mapping::Controller;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentKind {
    Controller,
    Service,
    Interceptor,
}

/// What a descriptor's factory produced.
pub(crate) enum Instance {
    /// A primary component plus any alias entries sharing its instance.
    Components(Vec<Component>),
    Interceptor(Arc<dyn Interceptor>),
}

type Build = Box<dyn Fn(&AppConfig, &str) -> anyhow::Result<Instance> + Send + Sync>;
type AliasFn<S> = Box<dyn Fn(Arc<S>) -> Component + Send + Sync>;

/// One discoverable component type.
pub struct ComponentDescriptor {
    type_name: String,
    kind: ComponentKind,
    name: Option<String>,
    interfaces: Vec<String>,
    build: Build,
}

impl ComponentDescriptor {
    /// A controller built by `factory`.
    #[must_use]
    pub fn controller<C: Controller>(
        type_name: impl Into<String>,
        factory: fn(&AppConfig) -> anyhow::Result<C>,
    ) -> Self {
        Self {
            type_name: type_name.into(),
            kind: ComponentKind::Controller,
            name: None,
            interfaces: Vec::new(),
            build: Box::new(move |config: &AppConfig, name: &str| {
                let instance = Arc::new(factory(config)?);
                Ok(Instance::Components(vec![Component::controller(
                    name, instance,
                )]))
            }),
        }
    }

    /// A service built by `factory`. Use the returned builder to set an
    /// explicit name or expose interfaces.
    #[must_use]
    pub fn service<S: Injectable>(
        type_name: impl Into<String>,
        factory: fn(&AppConfig) -> anyhow::Result<S>,
    ) -> ServiceDescriptor<S> {
        ServiceDescriptor {
            type_name: type_name.into(),
            name: None,
            factory,
            aliases: Vec::new(),
        }
    }

    /// An interceptor built by `factory`.
    #[must_use]
    pub fn interceptor<I: Interceptor + 'static>(
        type_name: impl Into<String>,
        factory: fn(&AppConfig) -> anyhow::Result<I>,
    ) -> Self {
        Self {
            type_name: type_name.into(),
            kind: ComponentKind::Interceptor,
            name: None,
            interfaces: Vec::new(),
            build: Box::new(move |config: &AppConfig, _: &str| {
                let interceptor: Arc<dyn Interceptor> = Arc::new(factory(config)?);
                Ok(Instance::Interceptor(interceptor))
            }),
        }
    }

    #[must_use]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    #[must_use]
    pub fn kind(&self) -> ComponentKind {
        self.kind
    }

    /// Interface paths a service is additionally registered under.
    #[must_use]
    pub fn interfaces(&self) -> &[String] {
        &self.interfaces
    }

    /// Registry name: the explicit one, else the lower-first simple type name.
    #[must_use]
    pub fn component_name(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => lower_first(simple_name(&self.type_name)),
        }
    }

    /// True when the type path is `root` or lies under `root::`.
    #[must_use]
    pub fn is_under(&self, root: &str) -> bool {
        match self.type_name.strip_prefix(root) {
            Some(rest) => rest.is_empty() || rest.starts_with("::"),
            None => false,
        }
    }

    pub(crate) fn instantiate(&self, config: &AppConfig) -> anyhow::Result<Instance> {
        (self.build)(config, &self.component_name())
    }
}

impl fmt::Debug for ComponentDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDescriptor")
            .field("type_name", &self.type_name)
            .field("kind", &self.kind)
            .field("name", &self.name)
            .field("interfaces", &self.interfaces)
            .finish_non_exhaustive()
    }
}

/// Builder for service descriptors.
pub struct ServiceDescriptor<S> {
    type_name: String,
    name: Option<String>,
    factory: fn(&AppConfig) -> anyhow::Result<S>,
    aliases: Vec<(String, AliasFn<S>)>,
}

impl<S: Injectable> ServiceDescriptor<S> {
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Also register the instance under `interface`, typed as `I`.
    ///
    /// `convert` is normally an unsizing coercion, e.g.
    /// `fn(s: Arc<Impl>) -> Arc<dyn Trait> { s }`.
    #[must_use]
    pub fn exposes<I>(mut self, interface: impl Into<String>, convert: fn(Arc<S>) -> Arc<I>) -> Self
    where
        I: ?Sized + Send + Sync + 'static,
    {
        let key = interface.into();
        let alias_key = key.clone();
        let alias: AliasFn<S> = Box::new(move |instance: Arc<S>| {
            Component::alias(alias_key.clone(), convert(instance))
        });
        self.aliases.push((key, alias));
        self
    }
}

impl<S: Injectable> From<ServiceDescriptor<S>> for ComponentDescriptor {
    fn from(service: ServiceDescriptor<S>) -> Self {
        let ServiceDescriptor {
            type_name,
            name,
            factory,
            aliases,
        } = service;
        let interfaces = aliases.iter().map(|(key, _)| key.clone()).collect();
        Self {
            type_name,
            kind: ComponentKind::Service,
            name,
            interfaces,
            build: Box::new(move |config: &AppConfig, name: &str| {
                let instance = Arc::new(factory(config)?);
                let mut components = Vec::with_capacity(aliases.len() + 1);
                components.push(Component::new(name, Arc::clone(&instance)));
                components.extend(aliases.iter().map(|(_, alias)| alias(Arc::clone(&instance))));
                Ok(Instance::Components(components))
            }),
        }
    }
}

/// Ordered list of everything the application can discover.
#[derive(Debug, Default)]
pub struct ComponentCatalog {
    descriptors: Vec<ComponentDescriptor>,
}

impl ComponentCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, descriptor: impl Into<ComponentDescriptor>) -> Self {
        self.push(descriptor);
        self
    }

    pub fn push(&mut self, descriptor: impl Into<ComponentDescriptor>) {
        self.descriptors.push(descriptor.into());
    }

    /// Descriptors under `root`, in catalog order. `root` may use `.` or
    /// `::` as separator.
    #[must_use]
    pub fn scan(&self, root: &str) -> Vec<&ComponentDescriptor> {
        let root = root.trim().replace('.', "::");
        let root = root.trim_end_matches("::");
        self.descriptors.iter().filter(|d| d.is_under(root)).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ComponentDescriptor> {
        self.descriptors.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

/// Last path segment of a type path.
#[must_use]
pub fn simple_name(type_name: &str) -> &str {
    type_name.rsplit("::").next().unwrap_or(type_name)
}

/// `DemoController` → `demoController`.
#[must_use]
pub fn lower_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}
