//! Données persistantes des tickets d'enchère.
//!
//! Trois fichiers indépendants dans le dossier de données :
//! - `guild_configs.json` : configuration et compteur de tickets par serveur,
//! - `auction_tickets.json` : tickets ouverts par salon,
//! - `auc_panel_template.json` : apparence du panneau de création.
//!
//! Chaque fichier est réécrit en entier après chaque modification.

use std::{collections::{BTreeSet, HashMap}, path::Path};

use serde::{Deserialize, Serialize};

use crate::components::utils::data::Data;

/// Configuration d'un serveur, créée avec les valeurs par défaut au premier usage.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(default)]
pub struct GuildConfig {
    /// Catégorie où sont créés les salons des tickets
    pub category_id: Option<u64>,
    /// Rôles ayant accès à tous les tickets
    pub staff_roles: BTreeSet<u64>,
    /// Numéro du dernier ticket ouvert. Jamais réutilisé.
    pub ticket_counter: u64,
}

/// Enchère ouverte, indexée par l'identifiant de son salon.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Ticket {
    pub ticket_id: u64,
    pub guild_id: u64,
    pub owner_id: u64,
    pub item_name: String,
    #[serde(default)]
    pub attachment: Option<String>,
    pub value_each: i64,
    pub quantity: i64,
    pub starting_bid: i64,
}

impl Ticket {
    pub fn total_worth(&self) -> i64 {
        self.value_each.saturating_mul(self.quantity)
    }
}

/// Apparence du panneau de création des tickets.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct PanelTemplate {
    pub title: String,
    pub description: String,
    pub footer: String,
    pub colour: String,
    pub thumbnail: String,
    pub button_text: String,
    pub button_colour: String,
}

impl Default for PanelTemplate {
    fn default() -> Self {
        Self {
            title: "Auction Ticket Panel".to_string(),
            description: "Click **Create Auction Ticket** below to open a private channel for your auction.".to_string(),
            footer: "Auction Ticket Panel".to_string(),
            colour: "blue".to_string(),
            thumbnail: String::new(),
            button_text: "Create Auction Ticket".to_string(),
            button_colour: "success".to_string(),
        }
    }
}

/// Modification partielle du panneau. Les champs à `None` sont conservés.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PanelUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub footer: Option<String>,
    pub colour: Option<String>,
    pub thumbnail: Option<String>,
    pub button_text: Option<String>,
    pub button_colour: Option<String>,
}

impl PanelUpdate {
    pub fn is_empty(&self) -> bool {
        *self == PanelUpdate::default()
    }
    fn apply(self, template: &mut PanelTemplate) {
        let fields = [
            (self.title, &mut template.title),
            (self.description, &mut template.description),
            (self.footer, &mut template.footer),
            (self.colour, &mut template.colour),
            (self.thumbnail, &mut template.thumbnail),
            (self.button_text, &mut template.button_text),
            (self.button_colour, &mut template.button_colour),
        ];
        for (value, field) in fields {
            if let Some(value) = value {
                *field = value;
            }
        }
    }
}

/// Stockage des tickets, des configurations et du panneau.
///
/// Chaque espace a son propre verrou : les opérations de lecture-modification
/// (compteur, mise) se font sous un seul verrou d'écriture.
pub struct TicketStore {
    guilds: Data<HashMap<u64, GuildConfig>>,
    tickets: Data<HashMap<u64, Ticket>>,
    panel: Data<PanelTemplate>,
}

impl TicketStore {
    pub fn load(data_dir: &Path) -> Self {
        Self {
            guilds: Data::from_file_or_default(data_dir, "guild_configs"),
            tickets: Data::from_file_or_default(data_dir, "auction_tickets"),
            panel: Data::from_file_or_default(data_dir, "auc_panel_template"),
        }
    }
    pub async fn guild_config(&self, guild_id: u64) -> GuildConfig {
        self.guilds.read().await.get(&guild_id).cloned().unwrap_or_default()
    }
    /// Incrémente le compteur du serveur et retourne la configuration à jour.
    /// Le nouveau numéro de ticket est `ticket_counter`.
    pub async fn allocate_ticket_number(&self, guild_id: u64) -> GuildConfig {
        let mut guilds = self.guilds.write().await;
        let config = guilds.entry(guild_id).or_default();
        config.ticket_counter += 1;
        config.clone()
    }
    /// Change la catégorie et ajoute un rôle staff.
    ///
    /// Retourne `true` si le rôle n'était pas encore configuré.
    pub async fn configure(&self, guild_id: u64, category_id: Option<u64>, staff_role: Option<u64>) -> bool {
        let mut guilds = self.guilds.write().await;
        let config = guilds.entry(guild_id).or_default();
        if category_id.is_some() {
            config.category_id = category_id;
        }
        match staff_role {
            Some(role) => config.staff_roles.insert(role),
            None => false,
        }
    }
    pub async fn ticket(&self, channel_id: u64) -> Option<Ticket> {
        self.tickets.read().await.get(&channel_id).cloned()
    }
    pub async fn insert_ticket(&self, channel_id: u64, ticket: Ticket) {
        self.tickets.write().await.insert(channel_id, ticket);
    }
    /// Remplace la mise de départ. `None` si le ticket n'existe plus.
    pub async fn update_bid(&self, channel_id: u64, starting_bid: i64) -> Option<Ticket> {
        let mut tickets = self.tickets.write().await;
        let ticket = tickets.get_mut(&channel_id)?;
        ticket.starting_bid = starting_bid;
        Some(ticket.clone())
    }
    pub async fn remove_ticket(&self, channel_id: u64) -> Option<Ticket> {
        self.tickets.write().await.remove(&channel_id)
    }
    pub async fn panel_template(&self) -> PanelTemplate {
        self.panel.read().await.clone()
    }
    pub async fn customize_panel(&self, update: PanelUpdate) -> PanelTemplate {
        let mut panel = self.panel.write().await;
        update.apply(&mut panel);
        panel.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticket(ticket_id: u64, starting_bid: i64) -> Ticket {
        Ticket {
            ticket_id,
            guild_id: 1,
            owner_id: 2,
            item_name: "Blue Gem".to_string(),
            attachment: None,
            value_each: 5_000_000,
            quantity: 3,
            starting_bid,
        }
    }

    #[tokio::test]
    async fn counter_is_monotonic_and_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let store = TicketStore::load(dir.path());
        assert_eq!(store.guild_config(7).await, GuildConfig::default());
        assert_eq!(store.allocate_ticket_number(7).await.ticket_counter, 1);
        assert_eq!(store.allocate_ticket_number(7).await.ticket_counter, 2);
        assert_eq!(store.allocate_ticket_number(8).await.ticket_counter, 1);

        let reloaded = TicketStore::load(dir.path());
        assert_eq!(reloaded.guild_config(7).await.ticket_counter, 2);
    }

    #[tokio::test]
    async fn concurrent_allocations_never_collide() {
        let dir = tempfile::tempdir().unwrap();
        let store = std::sync::Arc::new(TicketStore::load(dir.path()));
        let handles = (0..20).map(|_| {
            let store = std::sync::Arc::clone(&store);
            tokio::spawn(async move { store.allocate_ticket_number(1).await.ticket_counter })
        }).collect::<Vec<_>>();
        let mut numbers = BTreeSet::new();
        for handle in handles {
            numbers.insert(handle.await.unwrap());
        }
        assert_eq!(numbers, (1..=20).collect::<BTreeSet<_>>());
    }

    #[tokio::test]
    async fn configure_is_idempotent_for_roles() {
        let dir = tempfile::tempdir().unwrap();
        let store = TicketStore::load(dir.path());
        assert!(store.configure(1, Some(100), Some(5)).await);
        assert!(!store.configure(1, None, Some(5)).await);
        assert!(!store.configure(1, None, None).await);
        let config = store.guild_config(1).await;
        assert_eq!(config.category_id, Some(100));
        assert_eq!(config.staff_roles.into_iter().collect::<Vec<_>>(), vec![5]);
    }

    #[tokio::test]
    async fn tickets_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = TicketStore::load(dir.path());
        store.insert_ticket(42, ticket(1, 4_000_000)).await;
        assert_eq!(store.update_bid(42, 1_000_000).await.map(|t| t.starting_bid), Some(1_000_000));
        assert_eq!(store.update_bid(43, 1_000_000).await, None);

        let reloaded = TicketStore::load(dir.path());
        assert_eq!(reloaded.ticket(42).await, Some(ticket(1, 1_000_000)));
        assert_eq!(reloaded.remove_ticket(42).await.map(|t| t.ticket_id), Some(1));
        assert_eq!(reloaded.ticket(42).await, None);
        assert_eq!(TicketStore::load(dir.path()).ticket(42).await, None);
    }

    #[tokio::test]
    async fn panel_customization_is_partial() {
        let dir = tempfile::tempdir().unwrap();
        let store = TicketStore::load(dir.path());
        assert_eq!(store.panel_template().await, PanelTemplate::default());
        let panel = store.customize_panel(PanelUpdate {
            title: Some("Weekly Auctions".to_string()),
            button_colour: Some("danger".to_string()),
            ..Default::default()
        }).await;
        assert_eq!(panel.title, "Weekly Auctions");
        assert_eq!(panel.button_colour, "danger");
        assert_eq!(panel.description, PanelTemplate::default().description);
        assert_eq!(TicketStore::load(dir.path()).panel_template().await, panel);
    }

    #[tokio::test]
    async fn missing_panel_fields_use_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("auc_panel_template.json"), r#"{"title": "Old panel"}"#).unwrap();
        let panel = TicketStore::load(dir.path()).panel_template().await;
        assert_eq!(panel.title, "Old panel");
        assert_eq!(panel.button_text, "Create Auction Ticket");
    }

    #[tokio::test]
    async fn corrupt_files_fall_back_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("auction_tickets.json"), "[1, 2").unwrap();
        std::fs::write(dir.path().join("guild_configs.json"), "null").unwrap();
        let store = TicketStore::load(dir.path());
        assert_eq!(store.ticket(1).await, None);
        assert_eq!(store.guild_config(1).await, GuildConfig::default());
    }
}
