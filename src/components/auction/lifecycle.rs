//! Cycle de vie d'un ticket d'enchère.
//!
//! ```text
//! Requested ──> Open ──> Closed ──> PendingDeletion ──> Deleted
//!     │          │ ↺ edit_bid
//!     │          └──> Cancelled ──> Deleted
//!     └──> Rejected
//! ```
//!
//! Une demande rejetée ne crée ni salon, ni numéro de ticket, ni
//! enregistrement. Les étapes cosmétiques (permissions, renommage, messages,
//! suppression) sont journalisées en cas d'échec sans faire échouer l'opération.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use chrono::Utc;
use tokio::sync::Mutex;

use crate::{
    components::{items::ItemCache, utils::amount_parser},
    log_error, log_info, log_warn,
};
use super::{
    deletion::{ChannelDeletion, DeletionQueue, DeletionRegistry},
    error::TicketError,
    panel,
    platform::{ChannelRequest, Platform},
    store::{Ticket, TicketStore},
    validator::AuctionRules,
};

/// Délai maximal entre la fermeture d'un ticket et la suppression de son salon : un an.
pub const MAX_CLOSE_DELAY_SECS: u64 = 365 * 86400;

/// Réglages du cycle de vie, issus de la configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LifecycleSettings {
    pub rules: AuctionRules,
    /// Score minimal (sur 100) pour qu'un nom d'objet soit reconnu
    pub match_threshold: f64,
    /// Délai entre la fermeture d'un ticket et la suppression de son salon
    pub close_delay_secs: u64,
}

impl Default for LifecycleSettings {
    fn default() -> Self {
        Self {
            rules: AuctionRules::default(),
            match_threshold: 65.0,
            close_delay_secs: 3600,
        }
    }
}

/// État observable d'un salon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketState {
    Open,
    PendingDeletion,
}

/// Membre à l'origine d'une opération sur un ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user_id: u64,
    /// Le membre a la permission de gérer les salons
    pub can_manage_channels: bool,
}

impl Caller {
    pub fn may_manage(&self, ticket: &Ticket) -> bool {
        self.user_id == ticket.owner_id || self.can_manage_channels
    }
}

/// Membre qui ouvre un ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requester {
    pub user_id: u64,
    pub name: String,
    pub discriminator: u16,
}

impl Requester {
    fn discriminator(&self) -> String {
        match self.discriminator {
            0 => "0".to_string(),
            d => format!("{:04}", d),
        }
    }
    /// `name#0001`, ou `name` pour les comptes sans discriminant.
    pub fn tag(&self) -> String {
        match self.discriminator {
            0 => self.name.clone(),
            _ => format!("{}#{}", self.name, self.discriminator()),
        }
    }
    fn channel_name(&self) -> String {
        format!("auction-{}-{}", slug(&self.name), self.discriminator())
    }
}

fn slug(name: &str) -> String {
    name.to_lowercase().replace(' ', "-")
}

/// Demande d'ouverture, telle que saisie dans le formulaire.
#[derive(Debug, Clone)]
pub struct CreationRequest {
    pub guild_id: Option<u64>,
    pub requester: Requester,
    pub item_query: String,
    pub quantity: String,
    pub starting_bid: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenedTicket {
    pub channel_id: u64,
    pub ticket: Ticket,
}

pub struct TicketLifecycle {
    store: Arc<TicketStore>,
    items: Arc<ItemCache>,
    platform: Arc<dyn Platform>,
    deletions: Mutex<DeletionQueue>,
    deletions_resumed: AtomicBool,
    settings: LifecycleSettings,
}

fn parse_amount(text: &str) -> Result<i64, TicketError> {
    Ok(amount_parser::parse(text.trim())?)
}

fn parse_positive(text: &str) -> Result<i64, TicketError> {
    match parse_amount(text)? {
        n if n > 0 => Ok(n),
        _ => Err(TicketError::InvalidAmount(text.trim().to_string())),
    }
}

fn parse_bid(text: &str) -> Result<i64, TicketError> {
    match parse_amount(text)? {
        n if n >= 0 => Ok(n),
        _ => Err(TicketError::InvalidAmount(text.trim().to_string())),
    }
}

impl TicketLifecycle {
    pub fn new(
        store: Arc<TicketStore>,
        items: Arc<ItemCache>,
        platform: Arc<dyn Platform>,
        deletions: DeletionRegistry,
        settings: LifecycleSettings,
    ) -> Self {
        let deletions = DeletionQueue::new(deletions, Arc::clone(&platform));
        Self {
            store,
            items,
            platform,
            deletions: Mutex::new(deletions),
            deletions_resumed: AtomicBool::new(false),
            settings,
        }
    }
    pub fn settings(&self) -> &LifecycleSettings {
        &self.settings
    }
    /// Délai de fermeture, borné à [`MAX_CLOSE_DELAY_SECS`].
    fn close_delay(&self) -> chrono::Duration {
        let seconds = self.settings.close_delay_secs.min(MAX_CLOSE_DELAY_SECS);
        chrono::Duration::seconds(i64::try_from(seconds).unwrap_or(0))
    }
    /// Relance les suppressions en attente. Sans effet après le premier appel.
    pub async fn resume_deletions(&self) {
        if !self.deletions_resumed.swap(true, Ordering::SeqCst) {
            self.deletions.lock().await.init().await;
        }
    }
    pub async fn status(&self, channel_id: u64) -> Option<TicketState> {
        if self.store.ticket(channel_id).await.is_some() {
            return Some(TicketState::Open);
        }
        self.deletions.lock().await
            .find_one(move |task| task.data.channel_id == channel_id).await
            .map(|_| TicketState::PendingDeletion)
    }
    /// Ticket du salon, si `caller` peut le gérer.
    pub async fn authorize(&self, channel_id: u64, caller: Caller) -> Result<Ticket, TicketError> {
        let ticket = self.store.ticket(channel_id).await.ok_or(TicketError::TicketNotFound)?;
        if !caller.may_manage(&ticket) {
            return Err(TicketError::Unauthorized);
        }
        Ok(ticket)
    }

    /// Ouvre un ticket : vérifie la demande, crée le salon et enregistre le ticket.
    pub async fn create(&self, request: CreationRequest) -> Result<OpenedTicket, TicketError> {
        let guild_id = request.guild_id.ok_or(TicketError::NotInGuild)?;
        let quantity = parse_positive(&request.quantity)?;
        let starting_bid = parse_bid(&request.starting_bid)?;

        let query = request.item_query.trim();
        let item = self.items.find(query, self.settings.match_threshold).await
            .ok_or_else(|| TicketError::ItemNotFound(query.to_string()))?;
        if item.value <= 0 {
            return Err(TicketError::InvalidItemValue(item.name));
        }
        if item.value.checked_mul(quantity).is_none() {
            return Err(TicketError::InvalidAmount(request.quantity.trim().to_string()));
        }
        self.settings.rules.validate_creation(item.value, quantity, starting_bid)?;

        let config = self.store.allocate_ticket_number(guild_id).await;
        let ticket_id = config.ticket_counter;
        let channel_request = ChannelRequest {
            guild_id,
            name: request.requester.channel_name(),
            category_id: config.category_id,
            owner_id: request.requester.user_id,
            staff_roles: config.staff_roles.iter().copied().collect(),
        };
        let channel_id = match self.platform.create_ticket_channel(&channel_request).await {
            Ok(channel_id) => channel_id,
            Err(e) => {
                log_error!("Création du salon du ticket #{} (serveur {}) impossible, numéro perdu: {}", ticket_id, guild_id, e);
                return Err(e.into());
            }
        };
        let ticket = Ticket {
            ticket_id,
            guild_id,
            owner_id: request.requester.user_id,
            item_name: item.name,
            attachment: item.attachment,
            value_each: item.value,
            quantity,
            starting_bid,
        };
        self.store.insert_ticket(channel_id, ticket.clone()).await;
        log_info!("Ticket #{} ouvert dans le salon {} par {}", ticket_id, channel_id, request.requester.user_id);

        let welcome = panel::ticket_opened_message(&ticket, &request.requester.tag());
        for msg in [welcome, panel::donation_instructions(&ticket)] {
            if let Err(e) = self.platform.send_message(channel_id, msg).await {
                log_warn!("Message d'accueil du ticket #{} non envoyé: {}", ticket_id, e);
            }
        }
        Ok(OpenedTicket { channel_id, ticket })
    }

    /// Remplace la mise de départ, après vérification du plafond.
    pub async fn edit_bid(&self, channel_id: u64, caller: Caller, new_bid: &str) -> Result<Ticket, TicketError> {
        let ticket = self.authorize(channel_id, caller).await?;
        let new_bid = parse_bid(new_bid)?;
        self.settings.rules.validate_bid_edit(ticket.value_each, ticket.quantity, new_bid)?;
        self.store.update_bid(channel_id, new_bid).await.ok_or(TicketError::TicketNotFound)
    }

    /// Ferme le ticket : le propriétaire perd l'accès, le salon est renommé
    /// puis supprimé après le délai de fermeture.
    pub async fn close(&self, channel_id: u64, caller: Caller) -> Result<Ticket, TicketError> {
        let ticket = self.authorize(channel_id, caller).await?;
        let owner_name = self.platform.member_name(ticket.guild_id, ticket.owner_id).await;
        if owner_name.is_some() {
            if let Err(e) = self.platform.hide_channel_from(channel_id, ticket.owner_id).await {
                log_error!("Impossible de retirer l'accès du propriétaire au salon {}: {}", channel_id, e);
            }
        }
        let new_name = match &owner_name {
            Some(name) => format!("closed-{}-ticket", slug(name)),
            None => "closed-ticket".to_string(),
        };
        if let Err(e) = self.platform.rename_channel(channel_id, &new_name).await {
            log_error!("Impossible de renommer le salon {}: {}", channel_id, e);
        }
        self.store.remove_ticket(channel_id).await;

        let until = Utc::now() + self.close_delay();
        if let Err(e) = self.deletions.lock().await.add(ChannelDeletion { channel_id }, until).await {
            log_error!("Suppression du salon {} non planifiée: {}", channel_id, e);
        }
        log_info!("Ticket #{} fermé, salon {} supprimé dans {} s", ticket.ticket_id, channel_id, self.settings.close_delay_secs);
        Ok(ticket)
    }

    /// Annule le ticket et supprime son salon immédiatement.
    pub async fn cancel(&self, channel_id: u64, caller: Caller) -> Result<Ticket, TicketError> {
        self.authorize(channel_id, caller).await?;
        let ticket = self.store.remove_ticket(channel_id).await.ok_or(TicketError::TicketNotFound)?;
        if let Err(e) = self.platform.delete_channel(channel_id).await {
            log_error!("Impossible de supprimer le salon {}: {}", channel_id, e);
        }
        log_info!("Ticket #{} annulé", ticket.ticket_id);
        Ok(ticket)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serenity::async_trait;

    use crate::components::{
        auction::platform::mock::MockPlatform,
        items::{Catalog, CatalogError, Item},
    };
    use super::*;

    struct FixedCatalog(Vec<Item>);

    #[async_trait]
    impl Catalog for FixedCatalog {
        async fn fetch(&self) -> Result<Vec<Item>, CatalogError> {
            Ok(self.0.clone())
        }
    }

    const GUILD: u64 = 1;
    const OWNER: u64 = 42;
    const STRANGER: u64 = 43;

    struct Fixture {
        _dir: tempfile::TempDir,
        store: Arc<TicketStore>,
        platform: Arc<MockPlatform>,
        lifecycle: TicketLifecycle,
    }

    async fn fixture(settings: LifecycleSettings) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let catalog = FixedCatalog(vec![
            Item { name: "Blue Gem".to_string(), value: 5_000_000, attachment: Some("https://cdn.example/gem.png".to_string()) },
            Item { name: "Broken Relic".to_string(), value: 0, attachment: None },
            Item { name: "Ammo".to_string(), value: 12_000, attachment: None },
        ]);
        let items = Arc::new(ItemCache::load(dir.path(), Arc::new(catalog)));
        assert!(items.refresh().await);
        let store = Arc::new(TicketStore::load(dir.path()));
        let platform = Arc::new(MockPlatform::new().with_member(OWNER, "Bob Smith"));
        let lifecycle = TicketLifecycle::new(
            Arc::clone(&store),
            items,
            Arc::clone(&platform) as Arc<dyn Platform>,
            DeletionRegistry::load(dir.path()),
            settings,
        );
        Fixture { _dir: dir, store, platform, lifecycle }
    }

    fn request(item: &str, quantity: &str, bid: &str) -> CreationRequest {
        CreationRequest {
            guild_id: Some(GUILD),
            requester: Requester { user_id: OWNER, name: "Bob Smith".to_string(), discriminator: 7 },
            item_query: item.to_string(),
            quantity: quantity.to_string(),
            starting_bid: bid.to_string(),
        }
    }

    fn owner() -> Caller {
        Caller { user_id: OWNER, can_manage_channels: false }
    }

    #[tokio::test]
    async fn create_opens_channel_and_record() {
        let fx = fixture(LifecycleSettings::default()).await;
        fx.store.configure(GUILD, Some(500), Some(77)).await;
        let prior = fx.store.guild_config(GUILD).await.ticket_counter;

        let opened = fx.lifecycle.create(request("blue gem", "3", "4m")).await.unwrap();
        assert_eq!(opened.ticket.ticket_id, prior + 1);
        assert_eq!(opened.ticket.value_each, 5_000_000);
        assert_eq!(opened.ticket.starting_bid, 4_000_000);
        assert_eq!(opened.ticket.attachment.as_deref(), Some("https://cdn.example/gem.png"));
        assert_eq!(fx.store.ticket(opened.channel_id).await, Some(opened.ticket.clone()));
        assert_eq!(fx.lifecycle.status(opened.channel_id).await, Some(TicketState::Open));

        let created = fx.platform.created.lock().unwrap().clone();
        assert_eq!(created, vec![ChannelRequest {
            guild_id: GUILD,
            name: "auction-bob-smith-0007".to_string(),
            category_id: Some(500),
            owner_id: OWNER,
            staff_roles: vec![77],
        }]);
        let messages = fx.platform.messages.lock().unwrap();
        assert_eq!(messages.len(), 2);
        assert!(messages.iter().all(|(channel, _)| *channel == opened.channel_id));
    }

    #[tokio::test]
    async fn bid_at_limit_is_accepted() {
        let fx = fixture(LifecycleSettings::default()).await;
        assert!(fx.lifecycle.create(request("Blue Gem", "3", "4,500,000")).await.is_ok());
        let err = fx.lifecycle.create(request("Blue Gem", "3", "4500001")).await.unwrap_err();
        assert!(matches!(err, TicketError::BidExceedsRatio { max_allowed: 4_500_000, .. }));
    }

    #[tokio::test]
    async fn rejections_leave_no_trace() {
        let fx = fixture(LifecycleSettings::default()).await;
        let cases = [
            (request("Blue Gem", "1", "1m"), "BelowMinimumWorth"),
            (request("Blue Gem", "abc", "1m"), "InvalidAmount"),
            (request("Blue Gem", "0", "1m"), "InvalidAmount"),
            (request("Blue Gem", "3", "-5"), "InvalidAmount"),
            (request("Blue Gem", "99999999999b", "0"), "InvalidAmount"),
            (request("zzzz", "3", "1m"), "ItemNotFound"),
            (request("Broken Relic", "3", "1m"), "InvalidItemValue"),
        ];
        for (req, expected) in cases {
            let err = fx.lifecycle.create(req).await.unwrap_err();
            let kind = match err {
                TicketError::BelowMinimumWorth { .. } => "BelowMinimumWorth",
                TicketError::InvalidAmount(_) => "InvalidAmount",
                TicketError::ItemNotFound(_) => "ItemNotFound",
                TicketError::InvalidItemValue(_) => "InvalidItemValue",
                _ => "other",
            };
            assert_eq!(kind, expected);
        }
        assert!(fx.platform.created.lock().unwrap().is_empty());
        assert_eq!(fx.store.guild_config(GUILD).await.ticket_counter, 0);
    }

    #[tokio::test]
    async fn outside_guild_is_rejected() {
        let fx = fixture(LifecycleSettings::default()).await;
        let mut req = request("Blue Gem", "3", "1m");
        req.guild_id = None;
        assert!(matches!(fx.lifecycle.create(req).await, Err(TicketError::NotInGuild)));
    }

    #[tokio::test]
    async fn failed_channel_creation_consumes_number() {
        let fx = fixture(LifecycleSettings::default()).await;
        fx.platform.fail_create.store(true, std::sync::atomic::Ordering::SeqCst);
        assert!(matches!(fx.lifecycle.create(request("Blue Gem", "3", "1m")).await, Err(TicketError::Platform(_))));
        fx.platform.fail_create.store(false, std::sync::atomic::Ordering::SeqCst);
        let opened = fx.lifecycle.create(request("Blue Gem", "3", "1m")).await.unwrap();
        assert_eq!(opened.ticket.ticket_id, 2);
    }

    #[tokio::test]
    async fn cosmetic_failures_do_not_block_creation() {
        let fx = fixture(LifecycleSettings::default()).await;
        fx.platform.fail_cosmetic.store(true, std::sync::atomic::Ordering::SeqCst);
        let opened = fx.lifecycle.create(request("Blue Gem", "3", "1m")).await.unwrap();
        assert!(fx.store.ticket(opened.channel_id).await.is_some());
    }

    #[tokio::test]
    async fn edit_bid_rules() {
        let fx = fixture(LifecycleSettings::default()).await;
        let channel = fx.lifecycle.create(request("Blue Gem", "3", "1m")).await.unwrap().channel_id;
        let stranger = Caller { user_id: STRANGER, can_manage_channels: false };
        let staff = Caller { user_id: STRANGER, can_manage_channels: true };

        assert!(matches!(fx.lifecycle.edit_bid(channel, stranger, "2m").await, Err(TicketError::Unauthorized)));
        assert!(matches!(fx.lifecycle.edit_bid(channel, owner(), "two").await, Err(TicketError::InvalidAmount(_))));
        assert!(matches!(fx.lifecycle.edit_bid(channel, owner(), "4.6m").await, Err(TicketError::BidExceedsRatio { .. })));
        assert_eq!(fx.lifecycle.edit_bid(channel, staff, "4.5m").await.unwrap().starting_bid, 4_500_000);
        assert_eq!(fx.lifecycle.edit_bid(channel, owner(), "0").await.unwrap().starting_bid, 0);
        assert!(matches!(fx.lifecycle.edit_bid(999, owner(), "1m").await, Err(TicketError::TicketNotFound)));
    }

    #[tokio::test]
    async fn close_removes_record_and_schedules_deletion() {
        let fx = fixture(LifecycleSettings::default()).await;
        let channel = fx.lifecycle.create(request("Blue Gem", "3", "1m")).await.unwrap().channel_id;

        let stranger = Caller { user_id: STRANGER, can_manage_channels: false };
        assert!(matches!(fx.lifecycle.close(channel, stranger).await, Err(TicketError::Unauthorized)));

        fx.lifecycle.close(channel, owner()).await.unwrap();
        assert_eq!(fx.store.ticket(channel).await, None);
        assert!(matches!(fx.lifecycle.edit_bid(channel, owner(), "1m").await, Err(TicketError::TicketNotFound)));
        assert_eq!(*fx.platform.hidden.lock().unwrap(), vec![(channel, OWNER)]);
        assert_eq!(*fx.platform.renamed.lock().unwrap(), vec![(channel, "closed-bob-smith-ticket".to_string())]);
        assert!(fx.platform.deleted.lock().unwrap().is_empty());
        assert_eq!(fx.lifecycle.status(channel).await, Some(TicketState::PendingDeletion));
    }

    #[tokio::test]
    async fn close_without_owner_member() {
        let fx = fixture(LifecycleSettings::default()).await;
        let channel = fx.lifecycle.create(request("Blue Gem", "3", "1m")).await.unwrap().channel_id;
        fx.platform.members.lock().unwrap().clear();
        let staff = Caller { user_id: STRANGER, can_manage_channels: true };
        fx.lifecycle.close(channel, staff).await.unwrap();
        assert!(fx.platform.hidden.lock().unwrap().is_empty());
        assert_eq!(*fx.platform.renamed.lock().unwrap(), vec![(channel, "closed-ticket".to_string())]);
    }

    #[tokio::test]
    async fn deletion_runs_after_delay() {
        let settings = LifecycleSettings { close_delay_secs: 0, ..Default::default() };
        let fx = fixture(settings).await;
        let channel = fx.lifecycle.create(request("Blue Gem", "3", "1m")).await.unwrap().channel_id;
        fx.lifecycle.close(channel, owner()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(*fx.platform.deleted.lock().unwrap(), vec![channel]);
        assert_eq!(fx.lifecycle.status(channel).await, None);
    }

    #[tokio::test]
    async fn huge_close_delay_does_not_delete_now() {
        let settings = LifecycleSettings { close_delay_secs: u64::MAX, ..Default::default() };
        let fx = fixture(settings).await;
        let channel = fx.lifecycle.create(request("Blue Gem", "3", "1m")).await.unwrap().channel_id;
        fx.lifecycle.close(channel, owner()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(fx.platform.deleted.lock().unwrap().is_empty());
        assert_eq!(fx.lifecycle.status(channel).await, Some(TicketState::PendingDeletion));
    }

    #[tokio::test]
    async fn cosmetic_failures_do_not_block_close() {
        let fx = fixture(LifecycleSettings::default()).await;
        let channel = fx.lifecycle.create(request("Blue Gem", "3", "1m")).await.unwrap().channel_id;
        fx.platform.fail_cosmetic.store(true, std::sync::atomic::Ordering::SeqCst);

        assert!(fx.lifecycle.close(channel, owner()).await.is_ok());
        assert!(fx.platform.hidden.lock().unwrap().is_empty());
        assert!(fx.platform.renamed.lock().unwrap().is_empty());
        assert_eq!(fx.store.ticket(channel).await, None);
        assert_eq!(fx.lifecycle.status(channel).await, Some(TicketState::PendingDeletion));
    }

    #[tokio::test]
    async fn cosmetic_failures_do_not_block_cancel() {
        let fx = fixture(LifecycleSettings::default()).await;
        let channel = fx.lifecycle.create(request("Blue Gem", "3", "1m")).await.unwrap().channel_id;
        fx.platform.fail_cosmetic.store(true, std::sync::atomic::Ordering::SeqCst);

        assert_eq!(fx.lifecycle.cancel(channel, owner()).await.unwrap().ticket_id, 1);
        assert!(fx.platform.deleted.lock().unwrap().is_empty());
        assert_eq!(fx.store.ticket(channel).await, None);
        assert_eq!(fx.lifecycle.status(channel).await, None);
    }

    #[tokio::test]
    async fn cancel_deletes_immediately() {
        let fx = fixture(LifecycleSettings::default()).await;
        let channel = fx.lifecycle.create(request("Blue Gem", "3", "1m")).await.unwrap().channel_id;
        let stranger = Caller { user_id: STRANGER, can_manage_channels: false };
        assert!(matches!(fx.lifecycle.cancel(channel, stranger).await, Err(TicketError::Unauthorized)));

        fx.lifecycle.cancel(channel, owner()).await.unwrap();
        assert_eq!(fx.store.ticket(channel).await, None);
        assert_eq!(*fx.platform.deleted.lock().unwrap(), vec![channel]);
        assert!(fx.platform.renamed.lock().unwrap().is_empty());
        assert_eq!(fx.lifecycle.status(channel).await, None);
        assert!(matches!(fx.lifecycle.cancel(channel, owner()).await, Err(TicketError::TicketNotFound)));
    }
}
