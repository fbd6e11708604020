use crate::error::{BatonError, Result};
use dashmap::DashMap;
use std::any::{Any, TypeId};
use std::sync::Arc;

type Instance = Arc<dyn Any + Send + Sync>;

/// Casts a concrete instance to an `Arc<dyn Trait>`, boxed again as `dyn Any`.
/// Returns `None` if the instance is not of the bound implementation type.
type CasterFn = Arc<dyn Fn(Instance) -> Option<Instance> + Send + Sync>;

/// Thread-safe service registry backing `service` controller arguments.
#[derive(Clone, Default)]
pub struct Container {
    services: DashMap<TypeId, Instance>,
    trait_mappings: DashMap<TypeId, TypeId>,
    casters: DashMap<TypeId, CasterFn>,
}

impl Container {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T: 'static + Send + Sync>(&mut self, instance: T) -> &mut Self {
        tracing::debug!("Registering service {}", std::any::type_name::<T>());
        self.services.insert(TypeId::of::<T>(), Arc::new(instance));
        self
    }

    /// Make `Impl` resolvable as `Arc<Trait>`.
    pub fn register_trait<Trait, Impl, F>(&mut self, caster_fn: F) -> &mut Self
    where
        Trait: ?Sized + 'static + Send + Sync,
        Impl: 'static + Send + Sync,
        F: Fn(Arc<Impl>) -> Arc<Trait> + 'static + Send + Sync,
    {
        let trait_id = TypeId::of::<Trait>();
        self.trait_mappings.insert(trait_id, TypeId::of::<Impl>());

        let caster: CasterFn = Arc::new(move |instance: Instance| {
            let concrete = instance.downcast::<Impl>().ok()?;
            let trait_obj: Arc<Trait> = caster_fn(concrete);
            Some(Arc::new(trait_obj) as Instance)
        });
        self.casters.insert(trait_id, caster);
        self
    }

    pub fn resolve<T: 'static + Send + Sync>(&self) -> Result<Arc<T>> {
        let instance = self
            .services
            .get(&TypeId::of::<T>())
            .map(|entry| entry.value().clone())
            .ok_or_else(|| BatonError::DependencyNotFound {
                type_name: std::any::type_name::<T>().to_string(),
            })?;
        instance.downcast::<T>().map_err(|_| BatonError::DowncastFailed {
            type_name: std::any::type_name::<T>().to_string(),
        })
    }

    pub fn resolve_trait<T: ?Sized + 'static + Send + Sync>(&self) -> Result<Arc<T>> {
        let instance = self.resolve_erased(TypeId::of::<T>()).ok_or_else(|| {
            BatonError::DependencyNotFound {
                type_name: std::any::type_name::<T>().to_string(),
            }
        })?;
        // Trait lookups yield an `Arc<T>` wrapped in the erased instance.
        let wrapper = instance
            .downcast::<Arc<T>>()
            .map_err(|_| BatonError::DowncastFailed {
                type_name: std::any::type_name::<T>().to_string(),
            })?;
        Ok(wrapper.as_ref().clone())
    }

    /// Look up an instance by type id without knowing the type statically.
    ///
    /// Concrete registrations come back as the instance itself; trait
    /// bindings come back as an `Arc<dyn Trait>` inside the `dyn Any`.
    pub fn resolve_erased(&self, type_id: TypeId) -> Option<Instance> {
        if let Some(entry) = self.services.get(&type_id) {
            return Some(entry.value().clone());
        }

        let impl_id = *self.trait_mappings.get(&type_id)?;
        let caster = self.casters.get(&type_id)?.value().clone();
        let instance = self.services.get(&impl_id)?.value().clone();
        caster(instance)
    }

    pub fn contains<T: ?Sized + 'static>(&self) -> bool {
        let type_id = TypeId::of::<T>();
        self.services.contains_key(&type_id) || self.trait_mappings.contains_key(&type_id)
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}
