//! Module comportant les composants

pub mod auction;
pub use auction::Auction;
pub mod items;
pub use items::Items;
mod slash;
pub use slash::*;

// Fonctions utiles pour les composants
pub mod utils;
