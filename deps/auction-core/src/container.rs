use std::sync::Arc;
use tokio::sync::RwLock;

use crate::{Components, event::ComponentEventDispatcher, Component, declarative::Node};

/// # The component container
///
/// Stores the components of the bot so that the client and other components
/// (the slash command registration for instance) can reach them.
#[derive(Clone, Default)]
pub struct ComponentContainer(Components);
pub type RefContainer = Arc<RwLock<ComponentContainer>>;

impl ComponentContainer {
    pub fn new() -> ComponentContainer {
        ComponentContainer(Vec::new())
    }
    /// Create a [`ComponentEventDispatcher`] from the components in the container.
    /// Components added afterward are not seen by the dispatcher.
    pub fn get_event_dispatcher(&self) -> ComponentEventDispatcher {
        ComponentEventDispatcher::new(self.0.clone())
    }
    /// Add a component to the container and return a shared handle on it.
    pub fn add_component<T: 'static + Component>(&mut self, comp: T) -> Arc<T> {
        let arc = Arc::new(comp);
        self.0.push(Arc::clone(&arc) as Arc<dyn Component>);
        arc
    }
    /// Every command declaration of the registered components.
    pub fn declarations(&self) -> Vec<&'static Node> {
        self.0.iter().filter_map(|cmp| cmp.declarative()).collect()
    }
}
