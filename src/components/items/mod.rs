//! Cache des objets échangeables.
//!
//! Le cache est une copie du catalogue, remplacée en entier à chaque
//! rafraîchissement réussi et enregistrée dans `items.json`. Un échec laisse
//! la copie précédente en place.

pub mod catalog;
pub mod fuzzy;

use std::{path::Path, sync::Arc, time::Duration};

use auction_core::{
    declarative::{Command, Node},
    message, ApplicationCommandEmbed, ComponentDeclarative, ComponentEvent,
};
use serenity::{
    async_trait,
    client::Context,
    model::{
        application::interaction::Interaction,
        event::{Event, InteractionCreateEvent},
    },
};
use tokio::{sync::Mutex, task::JoinHandle};

use crate::{log_error, log_info, log_warn};
use super::utils::data::Data;
pub use catalog::{Catalog, CatalogError, HttpCatalog, Item};

pub struct ItemCache {
    items: Data<Arc<Vec<Item>>>,
    catalog: Arc<dyn Catalog>,
}

impl ItemCache {
    /// Charge la dernière copie enregistrée dans `<data_dir>/items.json`.
    pub fn load(data_dir: &Path, catalog: Arc<dyn Catalog>) -> Self {
        Self {
            items: Data::from_file_or_default(data_dir, "items"),
            catalog,
        }
    }
    /// Copie courante du cache. Les lectures ne bloquent jamais un rafraîchissement.
    pub async fn snapshot(&self) -> Arc<Vec<Item>> {
        Arc::clone(&*self.items.read().await)
    }
    /// Remplace le cache par le contenu du catalogue.
    ///
    /// Retourne `false` sans toucher au cache si le catalogue est injoignable,
    /// répond mal ou ne contient aucun objet.
    pub async fn refresh(&self) -> bool {
        log_info!("Rafraîchissement du cache des objets...");
        let items = match self.catalog.fetch().await {
            Ok(items) if items.is_empty() => {
                log_warn!("Cache des objets conservé: {}", CatalogError::Empty);
                return false;
            }
            Ok(items) => items,
            Err(e) => {
                log_warn!("Cache des objets conservé: {}", e);
                return false;
            }
        };
        let count = items.len();
        *self.items.write().await = Arc::new(items);
        log_info!("Cache des objets mis à jour: {} objets", count);
        true
    }
    /// Objet dont le nom ressemble le plus à `query`, si son score atteint `threshold`.
    ///
    /// À score égal, le premier objet du cache l'emporte.
    pub async fn find(&self, query: &str, threshold: f64) -> Option<Item> {
        let items = self.snapshot().await;
        let query = fuzzy::normalize(query);
        let mut best: Option<(f64, &Item)> = None;
        for item in items.iter() {
            let score = fuzzy::wratio(&query, &fuzzy::normalize(&item.name));
            if best.map_or(true, |(best_score, _)| score > best_score) {
                best = Some((score, item));
            }
        }
        match best {
            Some((score, item)) if score >= threshold => Some(item.clone()),
            _ => None,
        }
    }
    /// Rafraîchit le cache maintenant puis toutes les `period`.
    pub fn spawn_refresh_loop(self: Arc<Self>, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                self.refresh().await;
            }
        })
    }
}

static DECLARATION: Node = Node {
    commands: &[Command {
        name: "refresh_cache",
        description: "Manually refresh the items cache (Admin only).",
        args: &[],
    }],
};

/// Composant du cache des objets.
///
/// Lance la boucle de rafraîchissement à la première connexion et répond à
/// `/refresh_cache`.
pub struct Items {
    cache: Arc<ItemCache>,
    refresh_period: Duration,
    refresh_loop: Mutex<Option<JoinHandle<()>>>,
}

impl Items {
    pub fn new(cache: Arc<ItemCache>, refresh_period: Duration) -> Self {
        Self {
            cache,
            refresh_period,
            refresh_loop: Mutex::new(None),
        }
    }
    async fn on_ready(&self) {
        let mut refresh_loop = self.refresh_loop.lock().await;
        if refresh_loop.is_none() {
            log_info!("Démarrage de la boucle de rafraîchissement des objets");
            *refresh_loop = Some(Arc::clone(&self.cache).spawn_refresh_loop(self.refresh_period));
        }
    }
    async fn refresh_cache(&self, ctx: &Context, app_cmd: ApplicationCommandEmbed<'_>) {
        if !app_cmd.member_permissions().administrator() {
            app_cmd.direct_response(ctx, message::error("Only Administrators can run this command.")).await
                .unwrap_or_else(|e| log_error!("Erreur lors de l'envoi de la réponse: {}", e));
            return;
        }
        let delayed = match app_cmd.delayed_response(ctx, true).await {
            Ok(delayed) => delayed,
            Err(e) => {
                log_error!("Erreur lors de la création de la réponse: {}", e);
                return;
            }
        };
        let msg = if self.cache.refresh().await {
            let count = self.cache.snapshot().await.len();
            message::success(format!("Items cache has been refreshed from the API ({} items).", count))
        } else {
            message::warn("The catalog could not be reached. The previous items cache is kept.")
        };
        // Erreur déjà journalisée par la réponse différée.
        let _ = delayed.send_message(msg).await;
    }
}

impl ComponentDeclarative for Items {
    fn declarative(&self) -> Option<&'static Node> {
        Some(&DECLARATION)
    }
}

#[async_trait]
impl ComponentEvent for Items {
    async fn event(&self, ctx: &Context, event: &Event) {
        match event {
            Event::Ready(_) => self.on_ready().await,
            Event::InteractionCreate(InteractionCreateEvent {
                interaction: Interaction::ApplicationCommand(app_command), ..
            }) if app_command.data.name == "refresh_cache" => {
                self.refresh_cache(ctx, ApplicationCommandEmbed::new(app_command)).await
            }
            _ => (),
        }
    }
}
