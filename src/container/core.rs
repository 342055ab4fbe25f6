use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::error::ContainerError;
use crate::mapping::{Controller, ControllerMeta};

/// Type-erased handle to a component instance.
///
/// The handle always wraps an `Arc<T>` where `T` may be a concrete type or a
/// trait object, so the same instance can be looked up either as
/// `DemoServiceImpl` or as `dyn DemoService` depending on how it was
/// registered.
pub struct ComponentRef {
    instance: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

impl ComponentRef {
    #[must_use]
    pub fn new<T>(instance: Arc<T>) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
    {
        Self {
            instance: Arc::new(instance),
            type_name: std::any::type_name::<T>(),
        }
    }

    /// Recover the typed instance. `T` must be exactly the type the handle
    /// was created with.
    #[must_use]
    pub fn downcast<T>(&self) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.instance.downcast_ref::<Arc<T>>().map(Arc::clone)
    }

    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl Clone for ComponentRef {
    fn clone(&self) -> Self {
        Self {
            instance: Arc::clone(&self.instance),
            type_name: self.type_name,
        }
    }
}

impl fmt::Debug for ComponentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ComponentRef").field(&self.type_name).finish()
    }
}

/// A declared collaborator: inject the component registered under `target`
/// into the owner's slot `field`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    pub field: &'static str,
    pub target: String,
}

impl Dependency {
    #[must_use]
    pub fn new(field: &'static str, target: impl Into<String>) -> Self {
        Self {
            field,
            target: target.into(),
        }
    }
}

/// Setter-style wiring contract for components.
///
/// Components are fully constructed before wiring starts. The registry asks
/// for the [`InjectionSlot`] behind every declared field, checks each one
/// against its target and only then binds them.
pub trait Injectable: Send + Sync + 'static {
    fn dependencies(&self) -> Vec<Dependency> {
        Vec::new()
    }

    /// The slot behind `field`, or `None` if there is no such field.
    fn slot(&self, _field: &str) -> Option<&dyn InjectionSlot> {
        None
    }
}

/// A field that can receive one component.
pub trait InjectionSlot: Send + Sync {
    /// Whether [`wire`](Self::wire) would accept `target`. Binds nothing.
    fn check(&self, target: &ComponentRef) -> anyhow::Result<()>;

    fn wire(&self, target: &ComponentRef) -> anyhow::Result<()>;
}

/// Write-once injection slot.
///
/// ```rust
/// use std::sync::Arc;
/// use minimvc::container::{Autowired, ComponentRef};
///
/// let slot: Autowired<str> = Autowired::new();
/// slot.wire(&ComponentRef::new::<str>(Arc::from("hello"))).unwrap();
/// assert_eq!(slot.get().map(|s| &**s), Some("hello"));
/// ```
pub struct Autowired<T: ?Sized> {
    slot: OnceCell<Arc<T>>,
}

impl<T: ?Sized + Send + Sync + 'static> Autowired<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slot: OnceCell::new(),
        }
    }

    #[must_use]
    pub fn get(&self) -> Option<&Arc<T>> {
        self.slot.get()
    }

    #[must_use]
    pub fn is_wired(&self) -> bool {
        self.slot.get().is_some()
    }

    /// Bind the slot to `target`. Fails on a type mismatch or if the slot was
    /// already bound.
    pub fn wire(&self, target: &ComponentRef) -> anyhow::Result<()> {
        let instance = self.accept(target)?;
        self.slot
            .set(instance)
            .map_err(|_| anyhow::anyhow!("slot is already wired"))
    }

    fn accept(&self, target: &ComponentRef) -> anyhow::Result<Arc<T>> {
        if self.is_wired() {
            anyhow::bail!("slot is already wired");
        }
        target.downcast::<T>().ok_or_else(|| {
            anyhow::anyhow!(
                "expected {}, found {}",
                std::any::type_name::<T>(),
                target.type_name()
            )
        })
    }
}

impl<T: ?Sized + Send + Sync + 'static> InjectionSlot for Autowired<T> {
    fn check(&self, target: &ComponentRef) -> anyhow::Result<()> {
        self.accept(target).map(drop)
    }

    fn wire(&self, target: &ComponentRef) -> anyhow::Result<()> {
        Autowired::wire(self, target)
    }
}

impl<T: ?Sized + Send + Sync + 'static> Default for Autowired<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> fmt::Debug for Autowired<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Autowired")
            .field("target", &std::any::type_name::<T>())
            .field("wired", &self.slot.get().is_some())
            .finish()
    }
}

/// A named singleton owned by the registry.
pub struct Component {
    name: String,
    instance: ComponentRef,
    wiring: Option<Arc<dyn Injectable>>,
    dependencies: Vec<Dependency>,
    controller: Option<ControllerMeta>,
}

impl Component {
    /// A component whose declared dependencies come from the instance.
    #[must_use]
    pub fn new<T: Injectable>(name: impl Into<String>, instance: Arc<T>) -> Self {
        let dependencies = instance.dependencies();
        Self {
            name: name.into(),
            instance: ComponentRef::new(Arc::clone(&instance)),
            wiring: Some(instance),
            dependencies,
            controller: None,
        }
    }

    /// A component carrying routing metadata.
    #[must_use]
    pub fn controller<C: Controller>(name: impl Into<String>, instance: Arc<C>) -> Self {
        let meta = C::mapping().bind(Arc::clone(&instance));
        let mut component = Self::new(name, instance);
        component.controller = Some(meta);
        component
    }

    /// An extra key for an instance registered elsewhere (e.g. a service seen
    /// through one of its interfaces). Aliases declare no dependencies: the
    /// primary entry wires the shared instance.
    #[must_use]
    pub fn alias<T>(name: impl Into<String>, instance: Arc<T>) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            instance: ComponentRef::new(instance),
            wiring: None,
            dependencies: Vec::new(),
            controller: None,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.instance.type_name()
    }

    #[must_use]
    pub fn instance(&self) -> &ComponentRef {
        &self.instance
    }

    #[must_use]
    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    /// Routing metadata, present only for controllers.
    #[must_use]
    pub fn controller_meta(&self) -> Option<&ControllerMeta> {
        self.controller.as_ref()
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("name", &self.name)
            .field("type", &self.type_name())
            .field("dependencies", &self.dependencies)
            .field("controller", &self.controller.is_some())
            .finish()
    }
}

/// Component registry (IoC container).
///
/// Built single-threaded at startup: register everything, then call
/// [`resolve_dependencies`](Self::resolve_dependencies) once. After that the
/// registry is only read and can be shared freely across request threads.
#[derive(Debug, Default)]
pub struct ComponentRegistry {
    components: Vec<Component>,
    index: HashMap<String, usize>,
    wired: bool,
}

impl ComponentRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a component. Names are unique; a duplicate is rejected and the
    /// existing entry is kept.
    pub fn register(&mut self, component: Component) -> Result<(), ContainerError> {
        if self.index.contains_key(component.name()) {
            warn!(
                component = %component.name(),
                type_name = component.type_name(),
                "Duplicate component name rejected"
            );
            return Err(ContainerError::DuplicateComponent {
                name: component.name,
            });
        }
        debug!(
            component = %component.name(),
            type_name = component.type_name(),
            dependencies = component.dependencies.len(),
            controller = component.controller.is_some(),
            "Component registered"
        );
        self.index
            .insert(component.name.clone(), self.components.len());
        self.components.push(component);
        Ok(())
    }

    /// Wire every declared dependency in a single pass.
    ///
    /// Every edge is checked before anything is bound: a missing target, an
    /// unknown field, a type mismatch or a field declared twice leaves every
    /// slot untouched. Cycles are not detected: all instances already exist,
    /// so a cycle simply binds to them.
    pub fn resolve_dependencies(&mut self) -> Result<(), ContainerError> {
        if self.wired {
            return Err(ContainerError::AlreadyWired);
        }

        let mut plan = Vec::new();
        for component in &self.components {
            let mut fields = HashSet::new();
            for dep in &component.dependencies {
                let target = self.lookup(&dep.target).ok_or_else(|| {
                    ContainerError::UnresolvedDependency {
                        component: component.name.clone(),
                        field: dep.field.to_string(),
                        target: dep.target.clone(),
                    }
                })?;
                let Some(wiring) = component.wiring.as_deref() else {
                    continue;
                };
                let failed = |reason: String| ContainerError::InjectionFailed {
                    component: component.name.clone(),
                    field: dep.field.to_string(),
                    target: dep.target.clone(),
                    reason,
                };
                if !fields.insert(dep.field) {
                    return Err(failed("field is declared more than once".to_string()));
                }
                let slot = wiring
                    .slot(dep.field)
                    .ok_or_else(|| failed(format!("no injectable field '{}'", dep.field)))?;
                slot.check(target.instance())
                    .map_err(|e| failed(e.to_string()))?;
                plan.push((component, dep, slot, target));
            }
        }

        for &(component, dep, slot, target) in &plan {
            slot.wire(target.instance())
                .map_err(|e| ContainerError::InjectionFailed {
                    component: component.name.clone(),
                    field: dep.field.to_string(),
                    target: dep.target.clone(),
                    reason: e.to_string(),
                })?;
        }

        let edges = plan.len();
        self.wired = true;
        info!(
            components = self.components.len(),
            edges = edges,
            "Dependencies resolved"
        );
        Ok(())
    }

    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<&Component> {
        self.index.get(name).map(|&i| &self.components[i])
    }

    /// Typed lookup.
    #[must_use]
    pub fn get<T>(&self, name: &str) -> Option<Arc<T>>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        self.lookup(name).and_then(|c| c.instance.downcast::<T>())
    }

    /// Components in registration order.
    pub fn components(&self) -> impl Iterator<Item = &Component> {
        self.components.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    #[must_use]
    pub fn is_wired(&self) -> bool {
        self.wired
    }
}
