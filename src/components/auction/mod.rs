//! Tickets d'enchère.
//!
//! Un membre ouvre un salon privé depuis le panneau de création, en indiquant
//! l'objet mis aux enchères, la quantité et la mise de départ. La demande est
//! vérifiée ([`validator`]) puis le ticket suit son [`lifecycle`] jusqu'à la
//! suppression du salon.

pub mod deletion;
pub mod error;
pub mod lifecycle;
pub mod panel;
pub mod platform;
pub mod store;
pub mod validator;

use std::sync::Arc;

use auction_core::{
    declarative::{Argument, Command, Node},
    message::{self, Message},
    ApplicationCommandEmbed, ComponentDeclarative, ComponentEvent,
};
use serenity::{
    async_trait,
    builder::{CreateInputText, CreateInteractionResponse},
    client::Context,
    model::{
        application::{
            command::CommandOptionType,
            component::{ActionRowComponent, InputTextStyle},
            interaction::{
                application_command::ApplicationCommandInteraction,
                message_component::MessageComponentInteraction,
                modal::ModalSubmitInteraction,
                Interaction, InteractionResponseType,
            },
        },
        channel::Channel,
        event::{Event, InteractionCreateEvent},
        guild::Member,
        id::{ChannelId, GuildId},
        user::User,
        Permissions,
    },
};

use crate::{components::utils::amount_parser::format_amount, log_error, log_warn};
use error::TicketError;
use lifecycle::{Caller, CreationRequest, Requester, TicketLifecycle};
use platform::Platform;
use store::{PanelUpdate, TicketStore};

const CREATE_MODAL: &str = "auction_create_modal";
const ADMIN_ONLY: &str = "Only Administrators can run this command.";

static DECLARATION: Node = Node {
    commands: &[
        Command {
            name: "setup_ticket_panel",
            description: "Set up the Auction Ticket Panel (Admin only).",
            args: &[],
        },
        Command {
            name: "auction_config",
            description: "Configure auction settings (Admin only).",
            args: &[
                Argument {
                    name: "category_id",
                    type_: CommandOptionType::String,
                    description: "ID of the category channel for auction tickets.",
                    optional: true,
                },
                Argument {
                    name: "staff_role",
                    type_: CommandOptionType::Role,
                    description: "Staff role that can moderate auctions.",
                    optional: true,
                },
            ],
        },
        Command {
            name: "create_auction",
            description: "Create a new auction ticket (Admin only).",
            args: &[],
        },
        Command {
            name: "edit_bid",
            description: "Edit the starting bid of this auction ticket.",
            args: &[Argument {
                name: "new_bid",
                type_: CommandOptionType::String,
                description: "New starting bid (e.g. 500k, 5m, 5000000).",
                optional: false,
            }],
        },
        Command {
            name: "close_auction",
            description: "Close this auction ticket.",
            args: &[],
        },
        Command {
            name: "customize_auc_panel",
            description: "Customize the Auction Ticket Panel template (Admin only).",
            args: &[
                Argument { name: "title", type_: CommandOptionType::String, description: "Panel title", optional: true },
                Argument { name: "description", type_: CommandOptionType::String, description: "Panel description", optional: true },
                Argument { name: "footer", type_: CommandOptionType::String, description: "Panel footer", optional: true },
                Argument { name: "colour", type_: CommandOptionType::String, description: "red, blue, green, black, purple, gold or orange", optional: true },
                Argument { name: "thumbnail", type_: CommandOptionType::String, description: "Thumbnail URL", optional: true },
                Argument { name: "button_text", type_: CommandOptionType::String, description: "Label of the creation button", optional: true },
                Argument { name: "button_colour", type_: CommandOptionType::String, description: "primary, secondary, success or danger", optional: true },
            ],
        },
    ],
};

/// Interaction à laquelle répondre.
#[derive(Clone, Copy)]
enum Reply<'a> {
    Command(&'a ApplicationCommandInteraction),
    Component(&'a MessageComponentInteraction),
    Modal(&'a ModalSubmitInteraction),
}

impl<'a> Reply<'a> {
    async fn respond(self, ctx: &Context, msg: Message) {
        let result = match self {
            Reply::Command(i) => i.create_interaction_response(ctx, |resp| {
                resp.kind(InteractionResponseType::ChannelMessageWithSource)
                    .interaction_response_data(|data| msg.apply_response(data))
            }).await,
            Reply::Component(i) => i.create_interaction_response(ctx, |resp| {
                resp.kind(InteractionResponseType::ChannelMessageWithSource)
                    .interaction_response_data(|data| msg.apply_response(data))
            }).await,
            Reply::Modal(i) => i.create_interaction_response(ctx, |resp| {
                resp.kind(InteractionResponseType::ChannelMessageWithSource)
                    .interaction_response_data(|data| msg.apply_response(data))
            }).await,
        };
        if let Err(e) = result {
            log_error!("Erreur lors de l'envoi de la réponse: {}", e);
        }
    }
    /// Accuse réception tout de suite. La réponse est envoyée par [`Reply::edit`].
    async fn defer(self, ctx: &Context) -> bool {
        let result = match self {
            Reply::Command(i) => i.create_interaction_response(ctx, |resp| {
                resp.kind(InteractionResponseType::DeferredChannelMessageWithSource)
                    .interaction_response_data(|data| data.ephemeral(true))
            }).await,
            Reply::Component(i) => i.create_interaction_response(ctx, |resp| {
                resp.kind(InteractionResponseType::DeferredChannelMessageWithSource)
                    .interaction_response_data(|data| data.ephemeral(true))
            }).await,
            Reply::Modal(i) => i.create_interaction_response(ctx, |resp| {
                resp.kind(InteractionResponseType::DeferredChannelMessageWithSource)
                    .interaction_response_data(|data| data.ephemeral(true))
            }).await,
        };
        match result {
            Ok(()) => true,
            Err(e) => {
                log_error!("Erreur lors de la création de la réponse: {}", e);
                false
            }
        }
    }
    async fn edit(self, ctx: &Context, msg: Message) {
        let result = match self {
            Reply::Command(i) => i.edit_original_interaction_response(ctx, |resp| {
                *resp = msg.into();
                resp
            }).await,
            Reply::Component(i) => i.edit_original_interaction_response(ctx, |resp| {
                *resp = msg.into();
                resp
            }).await,
            Reply::Modal(i) => i.edit_original_interaction_response(ctx, |resp| {
                *resp = msg.into();
                resp
            }).await,
        };
        if let Err(e) = result {
            log_error!("Erreur lors de la modification de la réponse: {}", e);
        }
    }
    async fn open_creation_modal(self, ctx: &Context) {
        let result = match self {
            Reply::Command(i) => i.create_interaction_response(ctx, |resp| creation_modal(resp)).await,
            Reply::Component(i) => i.create_interaction_response(ctx, |resp| creation_modal(resp)).await,
            Reply::Modal(_) => {
                log_warn!("Un formulaire ne peut pas en ouvrir un autre");
                return;
            }
        };
        if let Err(e) = result {
            log_error!("Erreur lors de l'ouverture du formulaire: {}", e);
        }
    }
}

fn text_input<'a>(input: &'a mut CreateInputText, custom_id: &str, label: &str, placeholder: &str, max_length: u64) -> &'a mut CreateInputText {
    input
        .custom_id(custom_id)
        .label(label)
        .placeholder(placeholder)
        .style(InputTextStyle::Short)
        .max_length(max_length)
        .required(true)
}

fn creation_modal<'a, 'b>(resp: &'b mut CreateInteractionResponse<'a>) -> &'b mut CreateInteractionResponse<'a> {
    resp.kind(InteractionResponseType::Modal)
        .interaction_response_data(|data| {
            data.custom_id(CREATE_MODAL)
                .title("Create Auction")
                .components(|components| {
                    components
                        .create_action_row(|row| row.create_input_text(|input| {
                            text_input(input, "item_name", "Item Name", "Enter item name (partial or exact)", 100)
                        }))
                        .create_action_row(|row| row.create_input_text(|input| {
                            text_input(input, "quantity", "Quantity", "e.g. 10, 10k, 1m, etc.", 20)
                        }))
                        .create_action_row(|row| row.create_input_text(|input| {
                            text_input(input, "starting_bid", "Starting Bid", "e.g. 500k, 5m, 5000000", 20)
                        }))
                })
        })
}

fn modal_value<'a>(modal: &'a ModalSubmitInteraction, custom_id: &str) -> &'a str {
    modal.data.components.iter()
        .flat_map(|row| row.components.iter())
        .find_map(|component| match component {
            ActionRowComponent::InputText(input) if input.custom_id == custom_id => Some(input.value.as_str()),
            _ => None,
        })
        .unwrap_or_default()
}

fn member_permissions(member: Option<&Member>) -> Permissions {
    member
        .and_then(|member| member.permissions)
        .unwrap_or_else(Permissions::empty)
}

fn caller(user: &User, member: Option<&Member>) -> Caller {
    let permissions = member_permissions(member);
    Caller {
        user_id: user.id.0,
        can_manage_channels: permissions.manage_channels() || permissions.administrator(),
    }
}

/// Composant des tickets d'enchère.
pub struct Auction {
    lifecycle: Arc<TicketLifecycle>,
    store: Arc<TicketStore>,
    platform: Arc<dyn Platform>,
}

impl Auction {
    pub fn new(lifecycle: Arc<TicketLifecycle>, store: Arc<TicketStore>, platform: Arc<dyn Platform>) -> Self {
        Self { lifecycle, store, platform }
    }

    async fn on_command(&self, ctx: &Context, interaction: &ApplicationCommandInteraction) {
        let app_cmd = ApplicationCommandEmbed::new(interaction);
        let reply = Reply::Command(interaction);
        let is_admin = app_cmd.member_permissions().administrator();
        match app_cmd.fullname() {
            "edit_bid" => {
                let new_bid = app_cmd.get_string("new_bid").unwrap_or_default();
                let caller = caller(&interaction.user, interaction.member.as_ref());
                let msg = match self.lifecycle.edit_bid(interaction.channel_id.0, caller, new_bid).await {
                    Ok(ticket) => message::success(format!("Starting bid updated to **◊ {}**.", format_amount(ticket.starting_bid))),
                    Err(e) => message::error(e.bid_edit_message()),
                };
                reply.respond(ctx, msg).await
            }
            "close_auction" => {
                self.close(ctx, reply, interaction.channel_id, caller(&interaction.user, interaction.member.as_ref())).await
            }
            "setup_ticket_panel" | "auction_config" | "create_auction" | "customize_auc_panel" if !is_admin => {
                reply.respond(ctx, message::error(ADMIN_ONLY)).await
            }
            "setup_ticket_panel" => self.setup_ticket_panel(ctx, reply, interaction.channel_id).await,
            "auction_config" => self.auction_config(ctx, reply, app_cmd).await,
            "create_auction" => match interaction.guild_id {
                Some(_) => reply.open_creation_modal(ctx).await,
                None => reply.respond(ctx, message::error(TicketError::NotInGuild)).await,
            },
            "customize_auc_panel" => self.customize_auc_panel(ctx, reply, app_cmd).await,
            _ => (),
        }
    }

    async fn on_component(&self, ctx: &Context, interaction: &MessageComponentInteraction) {
        let reply = Reply::Component(interaction);
        let caller = caller(&interaction.user, interaction.member.as_ref());
        match interaction.data.custom_id.as_str() {
            panel::PANEL_CREATE_BUTTON => match interaction.guild_id {
                Some(_) => reply.open_creation_modal(ctx).await,
                None => reply.respond(ctx, message::error(TicketError::NotInGuild)).await,
            },
            panel::CLOSE_BUTTON => self.close(ctx, reply, interaction.channel_id, caller).await,
            panel::CANCEL_BUTTON => self.cancel(ctx, reply, interaction.channel_id, caller).await,
            _ => (),
        }
    }

    async fn on_modal(&self, ctx: &Context, modal: &ModalSubmitInteraction) {
        if modal.data.custom_id != CREATE_MODAL {
            return;
        }
        let reply = Reply::Modal(modal);
        let request = CreationRequest {
            guild_id: modal.guild_id.map(|guild_id| guild_id.0),
            requester: Requester {
                user_id: modal.user.id.0,
                name: modal.user.name.clone(),
                discriminator: modal.user.discriminator,
            },
            item_query: modal_value(modal, "item_name").to_string(),
            quantity: modal_value(modal, "quantity").to_string(),
            starting_bid: modal_value(modal, "starting_bid").to_string(),
        };
        if !reply.defer(ctx).await {
            return;
        }
        let msg = match self.lifecycle.create(request).await {
            Ok(opened) => message::success(format!("Auction ticket created! Check <#{}>.", opened.channel_id)),
            Err(e) => message::error(e),
        };
        reply.edit(ctx, msg).await
    }

    async fn close(&self, ctx: &Context, reply: Reply<'_>, channel_id: ChannelId, caller: Caller) {
        if !reply.defer(ctx).await {
            return;
        }
        let msg = match self.lifecycle.close(channel_id.0, caller).await {
            Ok(_) => message::success(format!(
                "Auction ticket closed. Owner access removed. This channel will auto-delete in {}.",
                panel::describe_delay(self.lifecycle.settings().close_delay_secs)
            )),
            Err(e) => message::error(e),
        };
        reply.edit(ctx, msg).await
    }

    /// La réponse part avant la suppression du salon.
    async fn cancel(&self, ctx: &Context, reply: Reply<'_>, channel_id: ChannelId, caller: Caller) {
        if let Err(e) = self.lifecycle.authorize(channel_id.0, caller).await {
            reply.respond(ctx, message::error(e)).await;
            return;
        }
        reply.respond(ctx, message::info("Cancelling and deleting channel...")).await;
        if let Err(e) = self.lifecycle.cancel(channel_id.0, caller).await {
            log_warn!("Annulation du ticket du salon {} impossible: {}", channel_id.0, e);
        }
    }

    async fn setup_ticket_panel(&self, ctx: &Context, reply: Reply<'_>, channel_id: ChannelId) {
        let template = self.store.panel_template().await;
        let msg = match self.platform.send_message(channel_id.0, panel::panel_message(&template)).await {
            Ok(()) => message::success("Ticket panel created!"),
            Err(e) => {
                log_error!("Envoi du panneau dans le salon {} impossible: {}", channel_id.0, e);
                message::error(format!("The panel could not be sent: {}", e))
            }
        };
        reply.respond(ctx, msg).await
    }

    async fn auction_config(&self, ctx: &Context, reply: Reply<'_>, app_cmd: ApplicationCommandEmbed<'_>) {
        let guild_id = match app_cmd.get_guild_id() {
            Some(guild_id) => guild_id,
            None => return reply.respond(ctx, message::error(TicketError::NotInGuild)).await,
        };
        let mut messages = Vec::new();
        let mut category_id = None;
        if let Some(raw) = app_cmd.get_string("category_id") {
            match raw.trim().parse::<u64>() {
                Ok(id) => match Self::find_category(ctx, guild_id, ChannelId(id)).await {
                    Some(name) => {
                        category_id = Some(id);
                        messages.push(format!("Category set to **{}** (ID: {}).", name, id));
                    }
                    None => messages.push("Invalid category ID provided.".to_string()),
                },
                Err(_) => messages.push("Category ID must be numeric.".to_string()),
            }
        }
        let staff_role = app_cmd.get_role("staff_role");
        let role_added = self.store.configure(guild_id.0, category_id, staff_role.map(|role| role.id.0)).await;
        if let Some(role) = staff_role {
            messages.push(match role_added {
                true => format!("Staff role added: **{}** (ID: {}).", role.name, role.id.0),
                false => format!("Staff role **{}** is already configured.", role.name),
            });
        }
        if messages.is_empty() {
            messages.push("No changes. Provide a category_id or staff_role.".to_string());
        }
        reply.respond(ctx, message::info(messages.join("\n"))).await
    }

    /// Nom de la catégorie `channel_id` si elle appartient au serveur.
    async fn find_category(ctx: &Context, guild_id: GuildId, channel_id: ChannelId) -> Option<String> {
        match channel_id.to_channel(ctx).await {
            Ok(Channel::Category(category)) if category.guild_id == guild_id => Some(category.name),
            Ok(_) => None,
            Err(e) => {
                log_warn!("Catégorie {} introuvable: {}", channel_id.0, e);
                None
            }
        }
    }

    async fn customize_auc_panel(&self, ctx: &Context, reply: Reply<'_>, app_cmd: ApplicationCommandEmbed<'_>) {
        let field = |name: &str| app_cmd.get_string(name).map(str::to_string);
        let update = PanelUpdate {
            title: field("title"),
            description: field("description"),
            footer: field("footer"),
            colour: field("colour"),
            thumbnail: field("thumbnail"),
            button_text: field("button_text"),
            button_colour: field("button_colour"),
        };
        if update.is_empty() {
            return reply.respond(ctx, message::warn("No changes. Provide at least one field to customize.")).await;
        }
        self.store.customize_panel(update).await;
        reply.respond(ctx, message::success("Auction panel template updated successfully.")).await
    }
}

impl ComponentDeclarative for Auction {
    fn declarative(&self) -> Option<&'static Node> {
        Some(&DECLARATION)
    }
}

#[async_trait]
impl ComponentEvent for Auction {
    async fn event(&self, ctx: &Context, event: &Event) {
        match event {
            Event::Ready(_) => self.lifecycle.resume_deletions().await,
            Event::InteractionCreate(InteractionCreateEvent { interaction, .. }) => match interaction {
                Interaction::ApplicationCommand(app_command) => self.on_command(ctx, app_command).await,
                Interaction::MessageComponent(component) => self.on_component(ctx, component).await,
                Interaction::ModalSubmit(modal) => self.on_modal(ctx, modal).await,
                _ => (),
            },
            _ => (),
        }
    }
}
