use serenity::builder::{
    CreateComponents, CreateEmbed, CreateInteractionResponseData, CreateMessage, EditInteractionResponse,
};
use serenity::model::application::component::ButtonStyle;
use serenity::utils::Colour;
pub use serenity::builder::CreateEmbed as Embed;

pub const COLOR_INFO: Colour = Colour(0x00C9FF);
pub const COLOR_SUCCESS: Colour = Colour(0x1ed760);
pub const COLOR_ERROR: Colour = Colour(0xFF0000);
pub const COLOR_WARN: Colour = Colour(0xFFB800);

/// A button attached below a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub custom_id: String,
    pub label: String,
    pub style: ButtonStyle,
}

impl Button {
    pub fn new<S1: Into<String>, S2: Into<String>>(custom_id: S1, label: S2, style: ButtonStyle) -> Self {
        Self { custom_id: custom_id.into(), label: label.into(), style }
    }
}

/// Message creation interface
///
/// Carries the same content to the different APIs (channel messages,
/// interaction responses, interaction edits).
#[derive(Debug, Clone, Default)]
pub struct Message {
    pub message: String,
    pub embeds: Vec<CreateEmbed>,
    pub buttons: Vec<Button>,
    pub ephemeral: bool,
}

impl Message {
    pub fn new() -> Self {
        Default::default()
    }
    pub fn with_text<S: Into<String>>(message: S) -> Self {
        Message {
            message: message.into(),
            ..Default::default()
        }
    }
    pub fn set_ephemeral(mut self, ephemeral: bool) -> Self {
        self.ephemeral = ephemeral;
        self
    }
    pub fn add_embed<F>(&mut self, f: F) -> &mut Self
        where F: FnOnce(&mut CreateEmbed) -> &mut CreateEmbed
    {
        let mut embed = CreateEmbed::default();
        f(&mut embed);
        self.embeds.push(embed);
        self
    }
    pub fn add_button(&mut self, button: Button) -> &mut Self {
        self.buttons.push(button);
        self
    }
    /// Fill an interaction response payload.
    pub fn apply_response<'a, 'b>(self, data: &'b mut CreateInteractionResponseData<'a>) -> &'b mut CreateInteractionResponseData<'a> {
        data.ephemeral(self.ephemeral);
        if !self.message.is_empty() {
            data.content(self.message);
        }
        data.set_embeds(self.embeds);
        if !self.buttons.is_empty() {
            let buttons = self.buttons;
            data.components(|c| add_buttons(c, &buttons));
        }
        data
    }
}
impl From<Message> for CreateMessage<'static> {
    fn from(message: Message) -> Self {
        let mut res = CreateMessage::default();
        if !message.message.is_empty() {
            res.content(message.message);
        }
        res.add_embeds(message.embeds);
        if !message.buttons.is_empty() {
            let buttons = message.buttons;
            res.components(|c| add_buttons(c, &buttons));
        }
        res
    }
}
impl From<Message> for EditInteractionResponse {
    fn from(message: Message) -> Self {
        let mut response = Self::default();
        response.content(message.message);
        response.set_embeds(message.embeds);
        if !message.buttons.is_empty() {
            let buttons = message.buttons;
            response.components(|c| add_buttons(c, &buttons));
        }
        response
    }
}

/// Put every button in a single action row.
fn add_buttons<'a>(components: &'a mut CreateComponents, buttons: &[Button]) -> &'a mut CreateComponents {
    components.create_action_row(|row| {
        for button in buttons {
            row.create_button(|b| {
                b.custom_id(&button.custom_id)
                    .label(&button.label)
                    .style(button.style)
            });
        }
        row
    })
}

/// Error message, always ephemeral
pub fn error<S: ToString>(error_message: S) -> Message {
    custom_embed("Error", error_message, COLOR_ERROR).set_ephemeral(true)
}
/// Warning message, always ephemeral
pub fn warn<S: ToString>(warn_message: S) -> Message {
    custom_embed("Warning", warn_message, COLOR_WARN).set_ephemeral(true)
}
/// Success message, always ephemeral
pub fn success<S: ToString>(success_message: S) -> Message {
    custom_embed("Done", success_message, COLOR_SUCCESS).set_ephemeral(true)
}
/// Information message, always ephemeral
pub fn info<S: ToString>(info_message: S) -> Message {
    custom_embed("Information", info_message, COLOR_INFO).set_ephemeral(true)
}
/// Custom embed message
pub fn custom_embed<S1, S2, C>(title: S1, message: S2, color: C) -> Message
    where
    S1: ToString,
    S2: ToString,
    C: Into<Colour>
{
    let mut embed = CreateEmbed::default();
    embed
        .title(title)
        .description(message)
        .color(color);
    Message {
        embeds: vec![embed],
        ..Default::default()
    }
}
