use crate::di::Container;
use std::sync::Arc;

/// Fluent construction of a [`Container`] before it is shared with resolvers.
///
/// # Example
/// ```
/// use baton::di::ContainerBuilder;
/// use std::sync::Arc;
///
/// trait Clock: Send + Sync {}
/// struct SystemClock;
/// impl Clock for SystemClock {}
///
/// let container = ContainerBuilder::new()
///     .register(SystemClock)
///     .bind::<dyn Clock, SystemClock, _>(|c| c as Arc<dyn Clock>)
///     .build();
/// assert!(container.contains::<dyn Clock>());
/// ```
#[derive(Default)]
pub struct ContainerBuilder {
    container: Container,
}

impl ContainerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T: 'static + Send + Sync>(mut self, instance: T) -> Self {
        self.container.register(instance);
        self
    }

    /// Bind a trait to a concrete implementation registered with [`Self::register`].
    pub fn bind<Trait, Impl, F>(mut self, caster: F) -> Self
    where
        Trait: ?Sized + 'static + Send + Sync,
        Impl: 'static + Send + Sync,
        F: Fn(Arc<Impl>) -> Arc<Trait> + 'static + Send + Sync,
    {
        self.container.register_trait::<Trait, Impl, F>(caster);
        self
    }

    pub fn build(self) -> Container {
        self.container
    }
}
