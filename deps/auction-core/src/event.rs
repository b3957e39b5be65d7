use serenity::{model::event::Event, client::Context, async_trait};
pub use serenity::prelude::RawEventHandler;
use crate::Components;

/// # The component event trait.
///
/// Every component must implement this trait to receive gateway events from [`ComponentEventDispatcher`].
/// It is up to the component to pick the events it cares about.
#[async_trait]
pub trait ComponentEvent: Sync + Send {
    async fn event(&self, ctx: &Context, event: &Event);
}

/// # The component event dispatcher.
///
/// Forwards every raw gateway event to all the components, in registration order.
///
/// See [`serenity::client::ClientBuilder::raw_event_handler()`] for more information.
pub struct ComponentEventDispatcher {
    components: Components
}

impl ComponentEventDispatcher {
    pub(crate) fn new(components: Components) -> Self {
        Self { components }
    }
}

#[async_trait]
impl RawEventHandler for ComponentEventDispatcher {
    async fn raw_event(&self, ctx: Context, ev: Event) {
        for comp in &self.components {
            comp.event(&ctx, &ev).await
        }
    }
}
