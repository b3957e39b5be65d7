use std::fmt;

use crate::components::utils::amount_parser::{format_amount, InvalidAmount};
use super::validator::Violation;

/// Erreur d'un appel à Discord.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("{0}")]
    Discord(#[from] serenity::Error),
    #[error("{0}")]
    Other(String),
}

/// Refus d'une opération sur un ticket.
///
/// Le texte est destiné au membre qui a lancé l'opération.
#[derive(Debug, thiserror::Error)]
pub enum TicketError {
    InvalidAmount(String),
    ItemNotFound(String),
    InvalidItemValue(String),
    BelowMinimumWorth { total: i64, minimum: i64 },
    BidExceedsRatio { total: i64, max_allowed: i64, bid: i64, percent: i64 },
    Unauthorized,
    TicketNotFound,
    NotInGuild,
    Platform(#[from] PlatformError),
}

impl fmt::Display for TicketError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TicketError::InvalidAmount(value) => write!(f,
                "Invalid numeric format: `{}`. Use plain integers or suffixes like 'k', 'm', or 'b'.", value
            ),
            TicketError::ItemNotFound(query) => write!(f,
                "**{}** not found in the cached item list. Try a more precise name.", query
            ),
            TicketError::InvalidItemValue(name) => write!(f,
                "**{}** has an invalid value. Cannot proceed.", name
            ),
            TicketError::BelowMinimumWorth { total, minimum } => {
                fmt::Display::fmt(&Violation::BelowMinimumWorth { total: *total, minimum: *minimum }, f)
            }
            TicketError::BidExceedsRatio { total, max_allowed, bid, percent } => {
                let violation = Violation::BidExceedsRatio { total: *total, max_allowed: *max_allowed, bid: *bid, percent: *percent };
                fmt::Display::fmt(&violation, f)
            }
            TicketError::Unauthorized => f.write_str("Only the ticket owner or staff can do this."),
            TicketError::TicketNotFound => f.write_str("This channel is not recognized as an auction ticket."),
            TicketError::NotInGuild => f.write_str("This command can only be used in a server."),
            TicketError::Platform(e) => write!(f, "Discord refused the operation: {}", e),
        }
    }
}

impl From<InvalidAmount> for TicketError {
    fn from(InvalidAmount(value): InvalidAmount) -> Self {
        TicketError::InvalidAmount(value)
    }
}

impl From<Violation> for TicketError {
    fn from(violation: Violation) -> Self {
        match violation {
            Violation::BelowMinimumWorth { total, minimum } => TicketError::BelowMinimumWorth { total, minimum },
            Violation::BidExceedsRatio { total, max_allowed, bid, percent } => {
                TicketError::BidExceedsRatio { total, max_allowed, bid, percent }
            }
        }
    }
}

impl TicketError {
    /// Message pour une mise refusée lors d'une modification.
    pub fn bid_edit_message(&self) -> String {
        match self {
            TicketError::BidExceedsRatio { max_allowed, bid, percent, .. } => format!(
                "**{}** exceeds the {}% limit (**◊ {}**).",
                format_amount(*bid), percent, format_amount(*max_allowed)
            ),
            other => other.to_string(),
        }
    }
}
