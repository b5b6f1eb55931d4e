//! Comptes utilisateurs, stockés sous la clé `users`

use chrono::Utc;
use log::info;
use thiserror::Error;

use crate::db::{load_collection, save_collection, KeyValueStore, StorageError, USERS_KEY};
use crate::models::{UserID, UserRecord};
use crate::utils::input_validation::NewUser;

pub const DEMO_NAME: &str = "Detector";
pub const DEMO_EMAIL: &str = "detector@gmail.com";
pub const DEMO_PHONE: &str = "1234567890";
pub const DEMO_AGE: u8 = 22;
pub const DEMO_PASSWORD: &str = "Detector@1234";

#[derive(Debug, Error)]
pub enum UserStoreError {
    #[error("Email already registered: {email}")]
    EmailAlreadyExists { email: String },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Copie en mémoire de la collection des utilisateurs.
///
/// Toute modification réécrit la collection entière dans le stockage.
#[derive(Debug, Default)]
pub struct UserStore {
    users: Vec<UserRecord>,
}

impl UserStore {
    pub fn load<S: KeyValueStore + ?Sized>(store: &S) -> Result<Self, StorageError> {
        Ok(Self {
            users: load_collection(store, USERS_KEY)?,
        })
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn exists(&self, email: &str) -> bool {
        self.users.iter().any(|user| user.email == email)
    }

    /// Ajoute un compte, sauf si l'email est déjà pris
    pub fn register<S: KeyValueStore + ?Sized>(
        &mut self,
        store: &mut S,
        candidate: UserRecord,
    ) -> Result<(), UserStoreError> {
        if self.exists(&candidate.email) {
            return Err(UserStoreError::EmailAlreadyExists {
                email: candidate.email,
            });
        }

        info!("Account created for {}", candidate.email);
        self.users.push(candidate);
        if let Err(e) = save_collection(store, USERS_KEY, &self.users) {
            self.users.pop();
            return Err(e.into());
        }
        Ok(())
    }

    /// Premier compte dont l'email et le mot de passe correspondent exactement
    pub fn authenticate(&self, email: &str, password: &str) -> Option<&UserRecord> {
        self.users
            .iter()
            .find(|user| user.email == email && user.password == password)
    }

    /// Garantit la présence du compte de démonstration
    pub fn seed_default_account<S: KeyValueStore + ?Sized>(
        &mut self,
        store: &mut S,
    ) -> Result<(), UserStoreError> {
        if self.exists(DEMO_EMAIL) {
            return Ok(());
        }

        info!("Seeding demo account {DEMO_EMAIL}");
        self.register(store, new_record(demo_user()))
    }
}

/// Crée un enregistrement complet à partir d'une saisie validée
pub fn new_record(user: NewUser) -> UserRecord {
    UserRecord {
        id: UserID::new(),
        name: user.name,
        email: user.email,
        phone: user.phone,
        age: user.age,
        password: user.password,
        created_at: Utc::now(),
    }
}

fn demo_user() -> NewUser {
    NewUser {
        name: DEMO_NAME.to_owned(),
        email: DEMO_EMAIL.to_owned(),
        phone: DEMO_PHONE.to_owned(),
        age: DEMO_AGE,
        password: DEMO_PASSWORD.to_owned(),
    }
}
