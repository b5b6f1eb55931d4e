//! Stockage clé-valeur durable, avec sauvegarde en JSON

use log::info;
use serde::{de::DeserializeOwned, Serialize};
use std::{
    collections::{BTreeMap, HashMap},
    fs::File,
    io::{self, ErrorKind::NotFound},
    path::PathBuf,
};
use thiserror::Error;

pub const USERS_KEY: &str = "users";
pub const REPORTS_KEY: &str = "reportsHistory";
pub const PROFILE_IMAGE_KEY: &str = "profileImage";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Impossible de lire le stockage: {0}")]
    Read(#[source] io::Error),
    #[error("Impossible d'écrire le stockage: {0}")]
    Write(#[source] io::Error),
    #[error("Document corrompu sous la clé {key}: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Un magasin de valeurs textuelles indexées par clé.
///
/// Chaque écriture remplace la valeur entière.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: String) -> Result<(), StorageError>;
}

/// Lit une collection JSON; une clé absente donne une collection vide.
pub fn load_collection<T, S>(store: &S, key: &str) -> Result<Vec<T>, StorageError>
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    match store.get(key)? {
        Some(raw) => serde_json::from_str(&raw).map_err(|source| StorageError::Corrupt {
            key: key.to_owned(),
            source,
        }),
        None => Ok(Vec::new()),
    }
}

/// Réécrit la collection entière sous la clé donnée
pub fn save_collection<T, S>(store: &mut S, key: &str, items: &[T]) -> Result<(), StorageError>
where
    T: Serialize,
    S: KeyValueStore + ?Sized,
{
    let raw = serde_json::to_string(items).map_err(|source| StorageError::Corrupt {
        key: key.to_owned(),
        source,
    })?;
    store.set(key, raw)
}

/// Toutes les clés dans un seul fichier JSON, réécrit à chaque modification.
pub struct JsonFileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl JsonFileStore {
    pub fn open(path: PathBuf) -> Result<Self, StorageError> {
        match File::open(&path) {
            Ok(f) => {
                let entries = serde_json::from_reader(f).map_err(|source| StorageError::Corrupt {
                    key: path.display().to_string(),
                    source,
                })?;
                Ok(Self { path, entries })
            }

            // Fichier non existant, on le crée
            Err(not_found) if not_found.kind() == NotFound => {
                info!("Storage file {} not found, creating new empty store", path.display());
                let store = Self {
                    path,
                    entries: BTreeMap::new(),
                };

                // On vérifie la sauvegarde immédiatement pour diminuer le risque de perte de données
                store.save()?;
                Ok(store)
            }

            Err(other) => Err(StorageError::Read(other)),
        }
    }

    fn save(&self) -> Result<(), StorageError> {
        let file = File::create(&self.path).map_err(StorageError::Write)?;
        serde_json::to_writer_pretty(file, &self.entries)
            .map_err(|e| StorageError::Write(e.into()))
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    /// En cas d'échec de l'écriture, l'ancienne valeur est restaurée.
    fn set(&mut self, key: &str, value: String) -> Result<(), StorageError> {
        let previous = self.entries.insert(key.to_owned(), value);
        if let Err(e) = self.save() {
            match previous {
                Some(old) => self.entries.insert(key.to_owned(), old),
                None => self.entries.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }
}

/// Stockage purement en mémoire
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Nombre d'écritures reçues depuis la création
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StorageError> {
        self.writes += 1;
        self.entries.insert(key.to_owned(), value);
        Ok(())
    }
}
