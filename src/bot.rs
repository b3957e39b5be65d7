//! Core de l'application.
//! L'initialisation du bot et la gestion des composants se fait dans ce module.

use std::sync::Arc;

use auction_core::{container::RefContainer, ComponentContainer};
use serenity::{http::Http, prelude::GatewayIntents, Client};
use tokio::sync::RwLock;

use crate::{
    components::{
        self as cmp,
        auction::{
            deletion::DeletionRegistry,
            lifecycle::TicketLifecycle,
            platform::{DiscordPlatform, Platform},
            store::TicketStore,
        },
        items::{CatalogError, HttpCatalog, ItemCache},
    },
    config::Config,
    log_info,
};

/// Erreur d'initialisation du bot.
#[derive(Debug, thiserror::Error)]
pub enum BotError {
    #[error("création du dossier de données impossible: {0}")]
    DataDir(#[from] std::io::Error),
    #[error("client du catalogue: {0}")]
    Catalog(#[from] CatalogError),
    #[error("client Discord: {0}")]
    Discord(#[from] serenity::Error),
}

type Result<T> = std::result::Result<T, BotError>;

/// Structure du bot.
///
/// Il s'agit de la classe mère de l'application.
///
/// Le bot est composé de plusieurs composants qui sont créés et placés dans un [ComponentContainer].
/// Le conteneur retourne au client du bot un [ComponentEventDispatcher], un event dispatcher
/// qui se charge de déployer les événements Discord dans les composants.
///
/// Les données partagées (cache des objets, tickets, suppressions en attente)
/// sont créées ici puis injectées dans les composants.
///
/// [ComponentEventDispatcher]: auction_core::event::ComponentEventDispatcher
pub struct Bot {
    /// Client discord de serenity
    client: Client,
    _cmp_container: RefContainer,
}

impl Bot {
    /// Crée un nouveau bot et l'initialise.
    pub async fn new(config: &Config) -> Result<Bot> {
        std::fs::create_dir_all(&config.data_dir)?;
        let data_dir = config.data_dir.as_path();

        let http = Arc::new(Http::new_with_application_id(&config.token, config.app_id));
        let catalog = HttpCatalog::new(&config.catalog.url, config.catalog_timeout())?;
        let items = Arc::new(ItemCache::load(data_dir, Arc::new(catalog)));
        let store = Arc::new(TicketStore::load(data_dir));
        let platform: Arc<dyn Platform> = Arc::new(DiscordPlatform::new(Arc::clone(&http)));
        let lifecycle = Arc::new(TicketLifecycle::new(
            Arc::clone(&store),
            Arc::clone(&items),
            Arc::clone(&platform),
            DeletionRegistry::load(data_dir),
            config.lifecycle_settings(),
        ));

        let ref_container = Arc::new(RwLock::new(ComponentContainer::new()));
        {
            let mut container = ref_container.write().await;
            container.add_component(cmp::Items::new(items, config.refresh_interval()));
            container.add_component(cmp::Auction::new(lifecycle, store, platform));
            container.add_component(cmp::SlashCommand::new(Arc::clone(&ref_container)));
        }
        let client = Client::builder(&config.token, GatewayIntents::non_privileged())
            .raw_event_handler(ref_container.read().await.get_event_dispatcher())
            .application_id(config.app_id)
            .await?;
        log_info!("Bot initialisé, données dans {}", data_dir.display());
        Ok(Bot {
            client,
            _cmp_container: ref_container,
        })
    }
    /// Lance le bot.
    pub async fn start(&mut self) -> Result<()> {
        Ok(self.client.start().await?)
    }
}
