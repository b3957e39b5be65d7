//! Messages affichés par le composant : panneau de création, ouverture d'un ticket.

use auction_core::message::{Button, Message};
use serenity::{model::application::component::ButtonStyle, utils::Colour};

use crate::components::utils::amount_parser::format_amount;
use super::store::{PanelTemplate, Ticket};

pub const PANEL_CREATE_BUTTON: &str = "ticket_panel_create";
pub const CLOSE_BUTTON: &str = "auction_close";
pub const CANCEL_BUTTON: &str = "auction_cancel";

/// Couleur d'embed par nom. Bleu par défaut.
pub fn embed_colour(name: &str) -> Colour {
    match name.to_lowercase().as_str() {
        "red" => Colour(0xe74c3c),
        "green" => Colour(0x2ecc71),
        "black" => Colour(0x000000),
        "purple" => Colour(0x9b59b6),
        "gold" => Colour(0xf1c40f),
        "orange" => Colour(0xe67e22),
        _ => Colour(0x3498db),
    }
}

/// Style de bouton par nom. Vert (`success`) par défaut.
pub fn button_style(name: &str) -> ButtonStyle {
    match name.to_lowercase().as_str() {
        "primary" => ButtonStyle::Primary,
        "secondary" => ButtonStyle::Secondary,
        "danger" => ButtonStyle::Danger,
        _ => ButtonStyle::Success,
    }
}

/// Panneau public avec le bouton d'ouverture d'un ticket.
pub fn panel_message(template: &PanelTemplate) -> Message {
    let mut msg = Message::new();
    msg.add_embed(|embed| {
        embed
            .title(&template.title)
            .description(&template.description)
            .color(embed_colour(&template.colour));
        if !template.footer.is_empty() {
            embed.footer(|footer| footer.text(&template.footer));
        }
        if !template.thumbnail.is_empty() {
            embed.thumbnail(&template.thumbnail);
        }
        embed
    });
    msg.add_button(Button::new(PANEL_CREATE_BUTTON, &template.button_text, button_style(&template.button_colour)));
    msg
}

/// Message d'accueil envoyé dans le salon d'un nouveau ticket.
pub fn ticket_opened_message(ticket: &Ticket, owner_tag: &str) -> Message {
    let mut msg = Message::with_text(format!("<@{}>, welcome to your auction ticket!", ticket.owner_id));
    let item = format!("{}x {}", ticket.quantity, ticket.item_name);
    msg.add_embed(|embed| {
        embed
            .title("Auction Ticket Opened")
            .description(format!("Please donate **{}** as required.", item))
            .color(embed_colour("green"))
            .field("Item", &item, false)
            .field("Starting Bid", format!("◊ {}", format_amount(ticket.starting_bid)), true)
            .field("Total Worth", format!("◊ {}", format_amount(ticket.total_worth())), true)
            .field("Value Each", format!("◊ {}", format_amount(ticket.value_each)), true)
            .footer(|footer| footer.text(format!("Ticket ID #{} | Opened by {}", ticket.ticket_id, owner_tag)));
        if let Some(attachment) = &ticket.attachment {
            embed.thumbnail(attachment);
        }
        embed
    });
    msg.add_button(Button::new(CANCEL_BUTTON, "Cancel", ButtonStyle::Danger))
        .add_button(Button::new(CLOSE_BUTTON, "Close", ButtonStyle::Primary));
    msg
}

/// Consignes de don envoyées sous le message d'accueil.
pub fn donation_instructions(ticket: &Ticket) -> Message {
    Message::with_text(format!(
        "**Please donate your auction items using Dank Memer**\n\
        Example: `/serverevents donate quantity:{} item:{}`\n\
        Once your donation is complete, it will be recorded for auction processing.",
        ticket.quantity, ticket.item_name
    ))
}

/// Durée lisible : `1 hour`, `90 minutes`, `45 seconds`.
pub fn describe_delay(seconds: u64) -> String {
    let (value, unit) = match seconds {
        s if s >= 3600 && s % 3600 == 0 => (s / 3600, "hour"),
        s if s >= 60 && s % 60 == 0 => (s / 60, "minute"),
        s => (s, "second"),
    };
    format!("{} {}{}", value, unit, if value == 1 { "" } else { "s" })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colour_names() {
        assert_eq!(embed_colour("Red"), Colour(0xe74c3c));
        assert_eq!(embed_colour("black"), Colour(0));
        assert_eq!(embed_colour("pink"), embed_colour("blue"));
        assert_eq!(button_style("DANGER"), ButtonStyle::Danger);
        assert_eq!(button_style("rainbow"), ButtonStyle::Success);
    }

    #[test]
    fn panel_has_creation_button() {
        let template = PanelTemplate { button_text: "Open".to_string(), button_colour: "primary".to_string(), ..Default::default() };
        let msg = panel_message(&template);
        assert_eq!(msg.embeds.len(), 1);
        assert_eq!(msg.buttons, vec![Button::new(PANEL_CREATE_BUTTON, "Open", ButtonStyle::Primary)]);
        assert!(!msg.ephemeral);
    }

    #[test]
    fn ticket_message_mentions_owner() {
        let ticket = Ticket {
            ticket_id: 4,
            guild_id: 1,
            owner_id: 99,
            item_name: "Blue Gem".to_string(),
            attachment: None,
            value_each: 5_000_000,
            quantity: 3,
            starting_bid: 4_000_000,
        };
        let msg = ticket_opened_message(&ticket, "bob#0001");
        assert!(msg.message.starts_with("<@99>"));
        let ids = msg.buttons.iter().map(|b| b.custom_id.as_str()).collect::<Vec<_>>();
        assert_eq!(ids, vec![CANCEL_BUTTON, CLOSE_BUTTON]);
        assert!(donation_instructions(&ticket).message.contains("quantity:3 item:Blue Gem"));
    }

    #[test]
    fn delays() {
        assert_eq!(describe_delay(3600), "1 hour");
        assert_eq!(describe_delay(7200), "2 hours");
        assert_eq!(describe_delay(5400), "90 minutes");
        assert_eq!(describe_delay(45), "45 seconds");
        assert_eq!(describe_delay(1), "1 second");
    }
}
