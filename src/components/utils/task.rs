//! Task runner for the bot.
//!
//! Every task is written in a [`Registry`] before being spawned and is removed
//! from it once it has run successfully. A task that fails, or that did not
//! get the chance to run before the bot stopped, stays in the registry and is
//! spawned again by [`TaskManager::init`].

use std::{time::Duration, collections::HashMap, sync::Arc};

use chrono::{DateTime, Utc};
use futures_locks::Mutex;
use crate::{log_error, log_info, log_debug};
use serde::{Deserialize, Serialize};
use serenity::async_trait;

#[async_trait]
pub trait DataFunc: Send + Sync + 'static {
    type Persistent: Send + Sync + 'static;
    async fn run(&self, persistent: &Self::Persistent) -> Result<(), String>;
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Task<D> {
    /// Unix timestamp (seconds) of the execution.
    pub until: i64,
    pub data: D
}

pub type TaskID = u64;

#[async_trait]
pub trait Registry {
    type Data: DataFunc + Clone;
    async fn register(&mut self, task: Task<Self::Data>) -> Result<TaskID, String>;
    async fn unregister(&mut self, id: TaskID) -> Result<(), String>;
    async fn get_all(&self) -> Vec<(TaskID, Task<Self::Data>)>;
    async fn find_one<F>(&self, f: F) -> Option<(TaskID, Task<Self::Data>)> where
        F: Fn(&Task<Self::Data>) -> bool + Send;
}

type Tasks<R> = Arc<Mutex<R>>;

pub struct TaskManager<D, R, P> where
    D: DataFunc<Persistent = P> + Clone,
    R: Registry<Data = D> + Send + 'static,
    P: Send + Sync + 'static
{
    tasks: Tasks<R>,
    task_handles: HashMap<TaskID, tokio::task::JoinHandle<()>>,
    persistent: Arc<P>
}

impl<D, R, P> TaskManager<D, R, P> where
    D: DataFunc<Persistent = P> + Clone + std::fmt::Debug,
    R: Registry<Data = D> + Send + 'static,
    P: Send + Sync + 'static
{
    pub fn new(registry: R, persistent_data: P) -> Self {
        Self {
            tasks: Arc::new(Mutex::new(registry)),
            task_handles: HashMap::new(),
            persistent: Arc::new(persistent_data)
        }
    }
    /// Spawn every task found in the registry. Overdue tasks run immediately.
    pub async fn init(&mut self) {
        let tasks = self.tasks.lock().await.get_all().await;
        log_info!("Initializing {} tasks", tasks.len());
        for (task_id, task) in tasks {
            log_debug!("Initializing task {}. Data: {:?}", task_id, task);
            let handle = self.spawn_task(task_id, task.data, task.until);
            self.track(task_id, handle);
        }
    }
    pub async fn add(&mut self, data: D, until: DateTime<Utc>) -> Result<TaskID, String> {
        let until = until.timestamp();
        let id = self.tasks.lock().await.register(Task {
            until,
            data: data.clone()
        }).await?;
        let handle = self.spawn_task(id, data, until);
        self.track(id, handle);
        Ok(id)
    }
    /// Garde le handle de la tâche et oublie ceux des tâches terminées.
    fn track(&mut self, id: TaskID, handle: tokio::task::JoinHandle<()>) {
        self.task_handles.retain(|_, handle| !handle.is_finished());
        self.task_handles.insert(id, handle);
    }
    fn spawn_task(&self, id: TaskID, data: D, until: i64) -> tokio::task::JoinHandle<()> {
        let tasks = Arc::clone(&self.tasks);
        let persistent = Arc::clone(&self.persistent);
        tokio::spawn(async move {
            let seconds = until - Utc::now().timestamp();
            if seconds > 0 {
                log_debug!("Task {}: Sleeping for {} seconds", id, seconds);
                tokio::time::sleep(Duration::from_secs(seconds as u64)).await;
            }
            log_debug!("Task {}: Running", id);
            if let Err(e) = data.run(&*persistent).await {
                log_error!("Task {} failed: {}", id, e);
                return;
            }
            if let Err(e) = tasks.lock().await.unregister(id).await {
                log_error!("Task {} failed to remove from registry: {}", id, e);
                return;
            }
            log_debug!("Task {}: Finished", id);
        })
    }
    /// First pending task matching `f`.
    pub async fn find_one<F>(&self, f: F) -> Option<(TaskID, Task<D>)> where
        F: Fn(&Task<D>) -> bool + Send
    {
        self.tasks.lock().await.find_one(f).await
    }
}

impl<D, R, P> Drop for TaskManager<D, R, P> where
    D: DataFunc<Persistent = P> + Clone,
    R: Registry<Data = D> + Send + 'static,
    P: Send + Sync + 'static
{
    fn drop(&mut self) {
        for task in self.task_handles.values() {
            task.abort();
        }
    }
}
