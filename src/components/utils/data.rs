//! Données persistantes des composants.
//!
//! Chaque [`Data`] correspond à un fichier JSON réécrit entièrement à chaque
//! modification. L'écriture se fait à la libération du verrou d'écriture
//! ([`DataGuard`]) : un échec d'écriture est journalisé mais n'interrompt pas
//! l'opération qui l'a provoqué.

use std::{
    path::{PathBuf, Path},
    ops::{DerefMut, Deref},
};

use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::{RwLock, RwLockWriteGuard, RwLockReadGuard};
use crate::{log_error, log_warn};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Serde(#[from] serde_json::Error),
}

#[derive(Debug)]
pub struct Data<T>(RwLock<T>, PathBuf);

impl<T> Data<T> {
    pub fn filename(dir: &Path, stem: &str) -> PathBuf {
        dir.join(format!("{}.json", stem))
    }
    pub fn new(dir: &Path, stem: &str, data: T) -> Self {
        Self(RwLock::new(data), Self::filename(dir, stem))
    }
    #[cfg(test)]
    pub fn path(&self) -> &Path {
        self.1.as_path()
    }
}
impl<T: DeserializeOwned> Data<T> {
    pub fn from_file(dir: &Path, stem: &str) -> Result<Self, Error> {
        let filepath = Self::filename(dir, stem);
        let file_content = std::fs::read_to_string(&filepath)?;
        let data: T = serde_json::from_str(&file_content)?;
        Ok(Self(RwLock::new(data), filepath))
    }
}
impl<T: DeserializeOwned + Default> Data<T> {
    /// Charge le fichier `<dir>/<stem>.json`.
    ///
    /// Un fichier absent donne la valeur par défaut. Un fichier illisible ou
    /// corrompu aussi, avec un message d'erreur dans les logs.
    pub fn from_file_or_default(dir: &Path, stem: &str) -> Self {
        let filepath = Self::filename(dir, stem);
        if !filepath.exists() {
            return Self::new(dir, stem, T::default());
        }
        match Self::from_file(dir, stem) {
            Ok(data) => data,
            Err(e) => {
                log_error!("Impossible de charger {}: {}. Valeur par défaut utilisée.", filepath.to_string_lossy(), e);
                Self::new(dir, stem, T::default())
            }
        }
    }
}
impl<T: Serialize> Data<T> {
    pub async fn read(&self) -> RwLockReadGuard<'_, T> {
        self.0.read().await
    }
    /// Verrou d'écriture. Le fichier est réécrit quand le verrou est libéré.
    pub async fn write(&self) -> DataGuard<'_, T> {
        DataGuard(self.0.write().await, self.1.as_path())
    }
    fn save(value: &T, path: &Path) -> Result<(), Error> {
        let value = serde_json::to_string_pretty(value)?;
        std::fs::write(path, value)?;
        Ok(())
    }
}

pub struct DataGuard<'a, T: Serialize>(RwLockWriteGuard<'a, T>, &'a Path);

impl<'a, T: Serialize> Deref for DataGuard<'a, T> {
    type Target = T;
    fn deref(&self) -> &Self::Target {
        self.0.deref()
    }
}
impl<'a, T: Serialize> DerefMut for DataGuard<'a, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.0.deref_mut()
    }
}
impl<'a, T: Serialize> Drop for DataGuard<'a, T> {
    fn drop(&mut self) {
        if let Err(e) = Data::<T>::save(self.0.deref(), self.1) {
            log_warn!("Impossible d'enregistrer {}: {}", self.1.to_string_lossy(), e);
        }
    }
}
