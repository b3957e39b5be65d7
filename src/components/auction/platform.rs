//! Opérations Discord utilisées par le cycle de vie des tickets.

use std::{collections::HashSet, sync::Arc};

use auction_core::message::Message;
use serenity::{
    async_trait,
    http::{error::Error as HttpError, Http},
    model::{
        channel::{ChannelType, PermissionOverwrite, PermissionOverwriteType},
        id::{ChannelId, GuildId, RoleId, UserId},
        Permissions,
    },
};

use crate::log_warn;
use super::error::PlatformError;

/// Salon privé à créer pour un ticket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelRequest {
    pub guild_id: u64,
    pub name: String,
    pub category_id: Option<u64>,
    pub owner_id: u64,
    pub staff_roles: Vec<u64>,
}

#[async_trait]
pub trait Platform: Send + Sync {
    /// Crée le salon, invisible pour `@everyone`, et retourne son identifiant.
    async fn create_ticket_channel(&self, request: &ChannelRequest) -> Result<u64, PlatformError>;
    async fn hide_channel_from(&self, channel_id: u64, user_id: u64) -> Result<(), PlatformError>;
    async fn rename_channel(&self, channel_id: u64, name: &str) -> Result<(), PlatformError>;
    async fn delete_channel(&self, channel_id: u64) -> Result<(), PlatformError>;
    async fn send_message(&self, channel_id: u64, message: Message) -> Result<(), PlatformError>;
    /// Nom du membre, `None` s'il a quitté le serveur.
    async fn member_name(&self, guild_id: u64, user_id: u64) -> Option<String>;
}

fn member_permissions() -> Permissions {
    Permissions::VIEW_CHANNEL
        | Permissions::SEND_MESSAGES
        | Permissions::READ_MESSAGE_HISTORY
        | Permissions::USE_SLASH_COMMANDS
}

/// Accès au salon : refusé à `@everyone`, ouvert au propriétaire et au staff.
pub fn ticket_overwrites(request: &ChannelRequest) -> Vec<PermissionOverwrite> {
    let mut overwrites = vec![
        PermissionOverwrite {
            allow: Permissions::empty(),
            deny: Permissions::VIEW_CHANNEL,
            kind: PermissionOverwriteType::Role(RoleId(request.guild_id)),
        },
        PermissionOverwrite {
            allow: member_permissions(),
            deny: Permissions::empty(),
            kind: PermissionOverwriteType::Member(UserId(request.owner_id)),
        },
    ];
    overwrites.extend(request.staff_roles.iter().map(|role| PermissionOverwrite {
        allow: member_permissions() | Permissions::MANAGE_CHANNELS,
        deny: Permissions::empty(),
        kind: PermissionOverwriteType::Role(RoleId(*role)),
    }));
    overwrites
}

/// Retire de la demande la catégorie et les rôles staff qui n'existent plus
/// sur le serveur.
pub fn without_stale(request: &ChannelRequest, categories: &HashSet<u64>, roles: &HashSet<u64>) -> ChannelRequest {
    let mut request = request.clone();
    if let Some(category_id) = request.category_id {
        if !categories.contains(&category_id) {
            log_warn!("Catégorie {} introuvable sur le serveur {}, salon créé hors catégorie", category_id, request.guild_id);
            request.category_id = None;
        }
    }
    request.staff_roles.retain(|role| {
        let exists = roles.contains(role);
        if !exists {
            log_warn!("Rôle staff {} introuvable sur le serveur {}, ignoré", role, request.guild_id);
        }
        exists
    });
    request
}

/// Accès réel à Discord par l'API HTTP.
pub struct DiscordPlatform {
    http: Arc<Http>,
}

impl DiscordPlatform {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
    /// Catégories et rôles actuels du serveur. La demande reste inchangée si
    /// Discord ne les fournit pas.
    async fn current_request(&self, request: &ChannelRequest) -> ChannelRequest {
        let guild_id = GuildId(request.guild_id);
        let channels = guild_id.channels(&*self.http).await;
        let roles = guild_id.roles(&*self.http).await;
        match (channels, roles) {
            (Ok(channels), Ok(roles)) => {
                let categories = channels.values()
                    .filter(|channel| channel.kind == ChannelType::Category)
                    .map(|channel| channel.id.0)
                    .collect();
                let roles = roles.keys().map(|role| role.0).collect();
                without_stale(request, &categories, &roles)
            }
            (Err(e), _) | (_, Err(e)) => {
                log_warn!("Salons et rôles du serveur {} illisibles: {}", request.guild_id, e);
                request.clone()
            }
        }
    }
}

/// Un salon déjà supprimé ne bloque pas sa suppression.
fn is_unknown_channel(error: &serenity::Error) -> bool {
    match error {
        serenity::Error::Http(error) => matches!(
            &**error,
            HttpError::UnsuccessfulRequest(response) if response.status_code == reqwest::StatusCode::NOT_FOUND
        ),
        _ => false,
    }
}

#[async_trait]
impl Platform for DiscordPlatform {
    async fn create_ticket_channel(&self, request: &ChannelRequest) -> Result<u64, PlatformError> {
        let request = &self.current_request(request).await;
        let overwrites = ticket_overwrites(request);
        let channel = GuildId(request.guild_id).create_channel(&*self.http, |chan| {
            chan.name(&request.name)
                .kind(ChannelType::Text)
                .permissions(overwrites);
            if let Some(category_id) = request.category_id {
                chan.category(ChannelId(category_id));
            }
            chan
        }).await?;
        Ok(channel.id.0)
    }
    async fn hide_channel_from(&self, channel_id: u64, user_id: u64) -> Result<(), PlatformError> {
        ChannelId(channel_id).create_permission(&*self.http, &PermissionOverwrite {
            allow: Permissions::empty(),
            deny: Permissions::VIEW_CHANNEL,
            kind: PermissionOverwriteType::Member(UserId(user_id)),
        }).await?;
        Ok(())
    }
    async fn rename_channel(&self, channel_id: u64, name: &str) -> Result<(), PlatformError> {
        ChannelId(channel_id).edit(&*self.http, |chan| chan.name(name)).await?;
        Ok(())
    }
    async fn delete_channel(&self, channel_id: u64) -> Result<(), PlatformError> {
        match ChannelId(channel_id).delete(&*self.http).await {
            Ok(_) => Ok(()),
            Err(e) if is_unknown_channel(&e) => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
    async fn send_message(&self, channel_id: u64, message: Message) -> Result<(), PlatformError> {
        ChannelId(channel_id).send_message(&*self.http, |msg| {
            *msg = message.into();
            msg
        }).await?;
        Ok(())
    }
    async fn member_name(&self, guild_id: u64, user_id: u64) -> Option<String> {
        self.http.get_member(guild_id, user_id).await
            .ok()
            .map(|member| member.user.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overwrites_hide_channel_from_everyone() {
        let request = ChannelRequest {
            guild_id: 10,
            name: "auction-bob-0001".to_string(),
            category_id: None,
            owner_id: 20,
            staff_roles: vec![30, 31],
        };
        let overwrites = ticket_overwrites(&request);
        assert_eq!(overwrites.len(), 4);
        assert_eq!(overwrites[0].kind, PermissionOverwriteType::Role(RoleId(10)));
        assert!(overwrites[0].deny.view_channel());
        assert_eq!(overwrites[1].kind, PermissionOverwriteType::Member(UserId(20)));
        assert!(overwrites[1].allow.send_messages() && !overwrites[1].allow.manage_channels());
        assert!(overwrites[2..].iter().all(|o| o.allow.manage_channels() && o.allow.read_message_history()));
    }

    #[test]
    fn stale_category_and_roles_are_dropped() {
        let request = ChannelRequest {
            guild_id: 10,
            name: "auction-bob-0001".to_string(),
            category_id: Some(500),
            owner_id: 20,
            staff_roles: vec![30, 31, 32],
        };
        let kept = without_stale(&request, &HashSet::from([500]), &HashSet::from([30, 31, 32]));
        assert_eq!(kept, request);

        let pruned = without_stale(&request, &HashSet::from([501]), &HashSet::from([31]));
        assert_eq!(pruned.category_id, None);
        assert_eq!(pruned.staff_roles, vec![31]);
        assert_eq!(ticket_overwrites(&pruned).len(), 3);
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use std::{
        collections::HashMap,
        sync::{atomic::{AtomicBool, AtomicU64, Ordering}, Mutex},
    };
    use super::*;

    /// Discord en mémoire : enregistre chaque appel.
    pub struct MockPlatform {
        next_channel: AtomicU64,
        pub fail_create: AtomicBool,
        pub fail_cosmetic: AtomicBool,
        pub members: Mutex<HashMap<u64, String>>,
        pub created: Mutex<Vec<ChannelRequest>>,
        pub hidden: Mutex<Vec<(u64, u64)>>,
        pub renamed: Mutex<Vec<(u64, String)>>,
        pub deleted: Mutex<Vec<u64>>,
        pub messages: Mutex<Vec<(u64, Message)>>,
    }

    impl MockPlatform {
        pub fn new() -> Self {
            Self {
                next_channel: AtomicU64::new(1000),
                fail_create: AtomicBool::new(false),
                fail_cosmetic: AtomicBool::new(false),
                members: Mutex::new(HashMap::new()),
                created: Mutex::new(Vec::new()),
                hidden: Mutex::new(Vec::new()),
                renamed: Mutex::new(Vec::new()),
                deleted: Mutex::new(Vec::new()),
                messages: Mutex::new(Vec::new()),
            }
        }
        pub fn with_member(self, user_id: u64, name: &str) -> Self {
            self.members.lock().unwrap().insert(user_id, name.to_string());
            self
        }
        fn cosmetic(&self) -> Result<(), PlatformError> {
            if self.fail_cosmetic.load(Ordering::SeqCst) {
                return Err(PlatformError::Other("missing permissions".to_string()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl Platform for MockPlatform {
        async fn create_ticket_channel(&self, request: &ChannelRequest) -> Result<u64, PlatformError> {
            if self.fail_create.load(Ordering::SeqCst) {
                return Err(PlatformError::Other("channel limit reached".to_string()));
            }
            self.created.lock().unwrap().push(request.clone());
            Ok(self.next_channel.fetch_add(1, Ordering::SeqCst))
        }
        async fn hide_channel_from(&self, channel_id: u64, user_id: u64) -> Result<(), PlatformError> {
            self.cosmetic()?;
            self.hidden.lock().unwrap().push((channel_id, user_id));
            Ok(())
        }
        async fn rename_channel(&self, channel_id: u64, name: &str) -> Result<(), PlatformError> {
            self.cosmetic()?;
            self.renamed.lock().unwrap().push((channel_id, name.to_string()));
            Ok(())
        }
        async fn delete_channel(&self, channel_id: u64) -> Result<(), PlatformError> {
            self.cosmetic()?;
            self.deleted.lock().unwrap().push(channel_id);
            Ok(())
        }
        async fn send_message(&self, channel_id: u64, message: Message) -> Result<(), PlatformError> {
            self.cosmetic()?;
            self.messages.lock().unwrap().push((channel_id, message));
            Ok(())
        }
        async fn member_name(&self, _guild_id: u64, user_id: u64) -> Option<String> {
            self.members.lock().unwrap().get(&user_id).cloned()
        }
    }
}
