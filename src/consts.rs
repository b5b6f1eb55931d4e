//! Valeurs par défaut de la configuration

pub const DEFAULT_DB_PATH: &str = "vitadetect.json"; // Fichier de stockage clé-valeur.
pub const DEFAULT_LOG_PATH: &str = "vitadetect.log"; // Journal de l'application.
pub const DEFAULT_EXPORT_DIR: &str = "."; // Dossier des rapports exportés.
pub const DEFAULT_LATENCY_MS: u64 = 1500; // Délai simulé avant chaque analyse.
pub const DEFAULT_CONFIDENCE_MIN: u8 = 70;
pub const DEFAULT_CONFIDENCE_MAX: u8 = 100; // Borne exclue.
