//! VITADETECT: un détecteur de carences vitaminiques de démonstration.
//!
//! L'analyse est simulée; seuls les comptes, l'historique des rapports et
//! leur export sont réels.

pub mod analysis;
pub mod config;
pub mod consts;
pub mod db;
pub mod export;
pub mod history;
pub mod imaging;
pub mod models;
pub mod profile;
pub mod reference;
pub mod report;
pub mod services;
pub mod users;
pub mod utils;
