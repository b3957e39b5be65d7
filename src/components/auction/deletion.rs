//! Suppression différée des salons des tickets fermés.
//!
//! Chaque suppression prévue est inscrite dans `deletions.json` avant que sa
//! minuterie ne soit lancée, et n'en sort qu'une fois le salon supprimé. Les
//! suppressions en attente sont relancées au démarrage du bot.

use std::{collections::BTreeMap, path::Path, sync::Arc};

use serde::{Deserialize, Serialize};
use serenity::async_trait;

use crate::components::utils::{
    data::Data,
    task::{DataFunc, Registry, Task, TaskID, TaskManager},
};
use super::platform::Platform;

/// Salon à supprimer.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ChannelDeletion {
    pub channel_id: u64,
}

#[async_trait]
impl DataFunc for ChannelDeletion {
    type Persistent = Arc<dyn Platform>;
    async fn run(&self, platform: &Arc<dyn Platform>) -> Result<(), String> {
        platform.delete_channel(self.channel_id).await
            .map_err(|e| format!("suppression du salon {} impossible: {}", self.channel_id, e))
    }
}

#[derive(Serialize, Deserialize, Default, Debug)]
#[serde(default)]
struct DeletionRows {
    last_id: TaskID,
    tasks: BTreeMap<TaskID, Task<ChannelDeletion>>,
}

/// Registre des suppressions, enregistré dans `deletions.json`.
pub struct DeletionRegistry(Data<DeletionRows>);

impl DeletionRegistry {
    pub fn load(data_dir: &Path) -> Self {
        Self(Data::from_file_or_default(data_dir, "deletions"))
    }
}

#[async_trait]
impl Registry for DeletionRegistry {
    type Data = ChannelDeletion;
    async fn register(&mut self, task: Task<ChannelDeletion>) -> Result<TaskID, String> {
        let mut rows = self.0.write().await;
        rows.last_id += 1;
        let id = rows.last_id;
        rows.tasks.insert(id, task);
        Ok(id)
    }
    async fn unregister(&mut self, id: TaskID) -> Result<(), String> {
        match self.0.write().await.tasks.remove(&id) {
            Some(_) => Ok(()),
            None => Err(format!("suppression {} inconnue", id)),
        }
    }
    async fn get_all(&self) -> Vec<(TaskID, Task<ChannelDeletion>)> {
        self.0.read().await.tasks.iter()
            .map(|(id, task)| (*id, task.clone()))
            .collect()
    }
    async fn find_one<F>(&self, f: F) -> Option<(TaskID, Task<ChannelDeletion>)> where
        F: Fn(&Task<ChannelDeletion>) -> bool + Send
    {
        self.0.read().await.tasks.iter()
            .find(|(_, task)| f(task))
            .map(|(id, task)| (*id, task.clone()))
    }
}

pub type DeletionQueue = TaskManager<ChannelDeletion, DeletionRegistry, Arc<dyn Platform>>;
