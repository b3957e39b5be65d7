//! Enregistrement des commandes slash.
//!
//! À chaque connexion, les commandes déclarées par les composants du
//! conteneur sont enregistrées sur tous les serveurs du bot.

use auction_core::{container::RefContainer, declarative::Node, ComponentDeclarative, ComponentEvent};
use serenity::{
    async_trait,
    client::Context,
    model::{event::{Event, ReadyEvent}, id::GuildId},
};

use crate::{log_debug, log_error, log_info};

pub struct SlashCommand {
    container: RefContainer,
}

impl SlashCommand {
    pub fn new(container: RefContainer) -> SlashCommand {
        SlashCommand { container }
    }

    async fn on_ready(&self, ctx: &Context, ready: &ReadyEvent) {
        let declarations = self.container.read().await.declarations();
        declarations.iter()
            .flat_map(|node| node.commands.iter())
            .for_each(|command| log_debug!("{}", command));
        for guild in &ready.ready.guilds {
            self.register(ctx, guild.id, &declarations).await;
        }
    }

    async fn register(&self, ctx: &Context, guild_id: GuildId, declarations: &[&'static Node]) {
        let status = guild_id.set_application_commands(ctx, |commands| {
            declarations.iter().for_each(|node| node.add_application_command(commands));
            commands
        }).await;
        let guild_name = guild_id.name(ctx).unwrap_or_else(|| guild_id.0.to_string());
        match status {
            Ok(commands) => log_info!("{} commandes enregistrées sur {}", commands.len(), guild_name),
            Err(why) => log_error!("Erreur lors de l'enregistrement des commandes sur \"{}\": {}", guild_name, why),
        }
    }
}

impl ComponentDeclarative for SlashCommand {}

#[async_trait]
impl ComponentEvent for SlashCommand {
    async fn event(&self, ctx: &Context, event: &Event) {
        if let Event::Ready(ready) = event {
            self.on_ready(ctx, ready).await
        }
    }
}
