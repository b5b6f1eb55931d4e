//! Fiche utilisateur et photo de profil, stockées sous la clé `profileImage`

use log::info;
use serde::{Deserialize, Serialize};

use crate::db::{load_collection, save_collection, KeyValueStore, StorageError, PROFILE_IMAGE_KEY};
use crate::imaging::ImagePayload;
use crate::models::{UserID, UserRecord};

/// Photo de profil d'un utilisateur
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePhoto {
    pub user_id: UserID,
    pub image: ImagePayload,
}

/// Copie en mémoire des photos de profil, au plus une par utilisateur.
#[derive(Debug, Default)]
pub struct ProfilePhotos {
    photos: Vec<ProfilePhoto>,
}

impl ProfilePhotos {
    pub fn load<S: KeyValueStore + ?Sized>(store: &S) -> Result<Self, StorageError> {
        Ok(Self {
            photos: load_collection(store, PROFILE_IMAGE_KEY)?,
        })
    }

    pub fn get(&self, user: UserID) -> Option<&ImagePayload> {
        self.photos
            .iter()
            .find(|photo| photo.user_id == user)
            .map(|photo| &photo.image)
    }

    /// Remplace la photo de l'utilisateur. Rien ne change si l'écriture échoue.
    pub fn set<S: KeyValueStore + ?Sized>(
        &mut self,
        store: &mut S,
        user: UserID,
        image: ImagePayload,
    ) -> Result<(), StorageError> {
        let mut updated: Vec<ProfilePhoto> = self
            .photos
            .iter()
            .filter(|photo| photo.user_id != user)
            .cloned()
            .collect();
        updated.push(ProfilePhoto {
            user_id: user,
            image,
        });

        save_collection(store, PROFILE_IMAGE_KEY, &updated)?;
        self.photos = updated;
        info!("Profile photo updated for user {user}");
        Ok(())
    }
}

/// Ce que la page de profil affiche
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub age: u8,
    pub photo: Option<ImagePayload>,
}

impl UserProfile {
    pub fn new(user: &UserRecord, photo: Option<&ImagePayload>) -> Self {
        Self {
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            age: user.age,
            photo: photo.cloned(),
        }
    }
}
