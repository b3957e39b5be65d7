use serenity::{
    client::Context,
    model::{
        application::interaction::{
            application_command::{ApplicationCommandInteraction, CommandDataOption, CommandDataOptionValue},
            InteractionResponseType,
        },
        guild::Role,
        id::GuildId,
        Permissions,
    },
};

use crate::message::Message;

/// Deferred answer to an application command.
///
/// The interaction is acknowledged right away ("the bot is thinking...") and
/// the final message is sent later with [`send_message`].
///
/// [`send_message`]: Self::send_message
pub struct DelayedResponse<'a> {
    pub message: Option<Message>,
    ctx: &'a Context,
    interaction: &'a ApplicationCommandInteraction,
}

impl<'a> DelayedResponse<'a> {
    pub async fn new(ctx: &'a Context, interaction: &'a ApplicationCommandInteraction, ephemeral: bool) -> serenity::Result<DelayedResponse<'a>> {
        interaction.create_interaction_response(ctx, |resp| {
            resp
                .kind(InteractionResponseType::DeferredChannelMessageWithSource)
                .interaction_response_data(|data| data.ephemeral(ephemeral))
        }).await.map_err(|e| {
            log::error!(target: "auction", "Cannot create response: {}", e);
            e
        })?;
        Ok(DelayedResponse {
            message: None,
            ctx,
            interaction,
        })
    }
    pub async fn send(mut self) -> serenity::Result<()> {
        let result = match self.message.take() {
            Some(msg) => self.interaction.edit_original_interaction_response(self.ctx, |resp| {
                *resp = msg.into();
                resp
            }).await.map(|_| ()),
            None => Ok(()),
        };
        if let Err(e) = &result {
            log::error!(target: "auction", "Cannot edit response: {}", e);
        }
        result
    }
    pub async fn send_message(mut self, msg: Message) -> serenity::Result<()> {
        self.message = Some(msg);
        self.send().await
    }
}

impl<'a> Drop for DelayedResponse<'a> {
    fn drop(&mut self) {
        if let Some(msg) = &self.message {
            log::warn!(target: "auction", "Delayed message not sent: {:?}", msg.message);
        }
    }
}

/// # Application command wrapper
///
/// Gives a direct access to the arguments of a slash command and to the
/// caller (user, guild, permissions). The bot only declares root commands,
/// so the arguments are always at the first level of the command data.
#[derive(Clone, Copy)]
pub struct ApplicationCommandEmbed<'a>(pub &'a ApplicationCommandInteraction);

impl<'a> ApplicationCommandEmbed<'a> {
    pub fn new(interaction: &'a ApplicationCommandInteraction) -> Self {
        ApplicationCommandEmbed(interaction)
    }
    /// Name of the command.
    pub fn fullname(&self) -> &'a str {
        self.0.data.name.as_str()
    }
    /// Guild where the command has been used.
    pub fn get_guild_id(&self) -> Option<GuildId> {
        self.0.guild_id
    }
    /// Permissions of the caller in the channel, as computed by Discord.
    /// Empty outside of a guild.
    pub fn member_permissions(&self) -> Permissions {
        self.0.member.as_ref()
            .and_then(|member| member.permissions)
            .unwrap_or_else(Permissions::empty)
    }
    /// Find the argument `name`.
    pub fn get_argument(&self, name: &str) -> Option<&'a CommandDataOption> {
        self.0.data.options.iter().find(|option| option.name == name)
    }
    /// Find the string argument `name`.
    pub fn get_string(&self, name: &str) -> Option<&'a str> {
        match self.get_argument(name)?.resolved.as_ref()? {
            CommandDataOptionValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }
    /// Find the role argument `name`.
    pub fn get_role(&self, name: &str) -> Option<&'a Role> {
        match self.get_argument(name)?.resolved.as_ref()? {
            CommandDataOptionValue::Role(role) => Some(role),
            _ => None,
        }
    }

    pub async fn delayed_response(&self, ctx: &'a Context, ephemeral: bool) -> serenity::Result<DelayedResponse<'a>> {
        DelayedResponse::new(ctx, self.0, ephemeral).await
    }

    pub async fn direct_response(&self, ctx: &Context, msg: Message) -> serenity::Result<()> {
        self.0.create_interaction_response(ctx, |resp| {
            resp.kind(InteractionResponseType::ChannelMessageWithSource)
                .interaction_response_data(|data| msg.apply_response(data))
        }).await
    }
}
