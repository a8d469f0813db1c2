use crate::container::scope::ServiceScope;
use crate::errors::CoreError;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

type Factory = Box<dyn Fn() -> Box<dyn Any + Send + Sync> + Send + Sync>;

/// Service entry in the collection
pub enum ServiceEntry {
    /// Single shared instance
    Instance(Arc<dyn Any + Send + Sync>),
    /// Factory producing a new instance per resolution
    Factory(Factory),
}

impl std::fmt::Debug for ServiceEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceEntry::Instance(_) => f.debug_tuple("Instance").field(&"<instance>").finish(),
            ServiceEntry::Factory(_) => f.debug_tuple("Factory").field(&"<factory>").finish(),
        }
    }
}

/// Identity of a registration: the service type plus an optional key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServiceKey {
    type_id: TypeId,
    key: Option<String>,
}

impl ServiceKey {
    /// Key for an unkeyed service of type `T`
    pub fn of<T: 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            key: None,
        }
    }

    /// Key for a service of type `T` registered under `key`
    pub fn keyed<T: 'static>(key: impl Into<String>) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            key: Some(key.into()),
        }
    }

    /// Service key name, if keyed
    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }
}

/// A registered service
#[derive(Debug)]
pub struct ServiceDescriptor {
    pub type_name: &'static str,
    pub key: Option<String>,
    pub scope: ServiceScope,
    pub entry: ServiceEntry,
}

/// Collection of services registered during application bootstrap
#[derive(Debug, Default)]
pub struct ServiceCollection {
    services: HashMap<ServiceKey, ServiceDescriptor>,
    order: Vec<ServiceKey>,
}

impl ServiceCollection {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, id: ServiceKey, descriptor: ServiceDescriptor) {
        if self.services.insert(id.clone(), descriptor).is_some() {
            tracing::trace!(
                "Replacing registration for {:?}",
                id.key()
            );
        } else {
            self.order.push(id);
        }
    }

    /// Register a singleton, replacing any previous registration of `T`
    pub fn add_singleton<T>(&mut self, service: T) -> &mut Self
    where
        T: Send + Sync + 'static,
    {
        self.insert(
            ServiceKey::of::<T>(),
            ServiceDescriptor {
                type_name: std::any::type_name::<T>(),
                key: None,
                scope: ServiceScope::Singleton,
                entry: ServiceEntry::Instance(Arc::new(service)),
            },
        );
        self
    }

    /// Register a singleton under `key`
    pub fn add_keyed_singleton<T>(&mut self, key: impl Into<String>, service: T) -> &mut Self
    where
        T: Send + Sync + 'static,
    {
        let key = key.into();
        self.insert(
            ServiceKey::keyed::<T>(key.clone()),
            ServiceDescriptor {
                type_name: std::any::type_name::<T>(),
                key: Some(key),
                scope: ServiceScope::Singleton,
                entry: ServiceEntry::Instance(Arc::new(service)),
            },
        );
        self
    }

    /// Register a transient service factory
    pub fn add_transient<T, F>(&mut self, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        let wrapped: Factory = Box::new(move || -> Box<dyn Any + Send + Sync> { Box::new(factory()) });
        self.insert(
            ServiceKey::of::<T>(),
            ServiceDescriptor {
                type_name: std::any::type_name::<T>(),
                key: None,
                scope: ServiceScope::Transient,
                entry: ServiceEntry::Factory(wrapped),
            },
        );
        self
    }

    /// Resolve a service instance
    pub fn resolve<T>(&self) -> Result<Arc<T>, CoreError>
    where
        T: Send + Sync + 'static,
    {
        self.try_resolve::<T>()
            .ok_or_else(|| CoreError::service_not_found(std::any::type_name::<T>()))
    }

    /// Try to resolve a service instance
    pub fn try_resolve<T>(&self) -> Option<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        self.resolve_entry(&ServiceKey::of::<T>())
    }

    /// Resolve a service registered under `key`
    pub fn resolve_keyed<T>(&self, key: &str) -> Result<Arc<T>, CoreError>
    where
        T: Send + Sync + 'static,
    {
        self.resolve_entry(&ServiceKey::keyed::<T>(key))
            .ok_or_else(|| {
                CoreError::service_not_found(format!("{} (key '{}')", std::any::type_name::<T>(), key))
            })
    }

    fn resolve_entry<T>(&self, id: &ServiceKey) -> Option<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        match &self.services.get(id)?.entry {
            ServiceEntry::Instance(instance) => instance.clone().downcast::<T>().ok(),
            ServiceEntry::Factory(factory) => {
                let boxed = factory().downcast::<T>().ok()?;
                Some(Arc::from(boxed))
            }
        }
    }

    /// Check if an unkeyed service of type `T` is registered
    pub fn contains<T: 'static>(&self) -> bool {
        self.services.contains_key(&ServiceKey::of::<T>())
    }

    /// Check if a service of type `T` is registered under `key`
    pub fn contains_keyed<T: 'static>(&self, key: &str) -> bool {
        self.services.contains_key(&ServiceKey::keyed::<T>(key))
    }

    /// Keys under which services of type `T` are registered, in registration order
    pub fn keys_of<T: 'static>(&self) -> Vec<&str> {
        let type_id = TypeId::of::<T>();
        self.order
            .iter()
            .filter(|id| id.type_id == type_id)
            .filter_map(ServiceKey::key)
            .collect()
    }

    /// Scope of the unkeyed registration of `T`
    pub fn scope_of<T: 'static>(&self) -> Option<ServiceScope> {
        self.services
            .get(&ServiceKey::of::<T>())
            .map(|descriptor| descriptor.scope)
    }

    /// Registered descriptors, in registration order
    pub fn descriptors(&self) -> impl Iterator<Item = &ServiceDescriptor> {
        self.order.iter().filter_map(|id| self.services.get(id))
    }

    /// Type names of registered services, in registration order
    pub fn service_types(&self) -> Vec<&'static str> {
        self.descriptors().map(|descriptor| descriptor.type_name).collect()
    }

    /// Get the number of registered services
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Check if nothing is registered
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}
