//! # Core library of the auction bot
//!
//! This library provides the plumbing shared by every component of the bot.
//!
//! ## Components system
//!
//! The bot is made of components. Each component manages its own data
//! and receives every gateway event from the client.
//!
//! Each component must implement the [`Component`] trait, which is composed of two traits:
//! - [`ComponentEvent`] which handles Discord gateway events.
//! - [`ComponentDeclarative`] which declares the application commands
//!     (names, arguments, descriptions) the component answers to.
//!
//! ## Simplify serenity
//!
//! [`serenity`] implements the Discord API very well but the builders are verbose.
//! [`message`] and [`embed`] wrap the few shapes the bot needs: ephemeral replies,
//! deferred replies and messages with buttons.

pub mod declarative;
pub mod event;
pub mod container;
pub mod embed;
pub mod message;
use std::sync::Arc;

pub use declarative::ComponentDeclarative;
pub use event::ComponentEvent;
pub use container::ComponentContainer;
pub use embed::ApplicationCommandEmbed;

pub trait Component: ComponentDeclarative + ComponentEvent {}
impl<T: ComponentDeclarative + ComponentEvent> Component for T {}

pub type Components = Vec<Arc<dyn Component>>;
