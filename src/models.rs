//! Modèle de données

use std::fmt;

use chrono::{DateTime, Local, Utc};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use strum_macros::EnumIter;
use uuid::Uuid;

use crate::imaging::ImagePayload;

/// Un identifiant unique d'utilisateur.
#[derive(
    Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Hash, PartialOrd, Ord, Display,
)]
pub struct UserID(Uuid);

impl UserID {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for UserID {
    fn default() -> Self {
        Self::new()
    }
}

/// Un identifiant unique de rapport, de la forme `RPT-<hex>`.
#[derive(Debug, Serialize, Deserialize, Clone, Eq, PartialEq, Hash, PartialOrd, Ord, Display)]
#[serde(transparent)]
pub struct ReportID(String);

impl ReportID {
    pub fn new() -> Self {
        Self(format!("RPT-{}", Uuid::new_v4().simple()))
    }
}

impl Default for ReportID {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for ReportID {
    fn from(id: &str) -> Self {
        Self(id.trim().to_owned())
    }
}

impl AsRef<str> for ReportID {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Un compte utilisateur tel qu'il est stocké sous la clé `users`.
///
/// Le mot de passe est conservé en clair: l'application est une démo
/// sans aucune prétention de sécurité.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Display)]
#[serde(rename_all = "camelCase")]
#[display("{name} <{email}>")]
pub struct UserRecord {
    pub id: UserID,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub age: u8,
    pub password: String,
    pub created_at: DateTime<Utc>,
}

/// Catégorie de carence détectée
#[derive(
    Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, Display,
)]
pub enum DeficiencyType {
    A,
    B,
    C,
    D,
    E,
}

impl DeficiencyType {
    /// Interprète une lettre de type. Toute valeur inconnue retombe sur `A`.
    pub fn parse_or_default(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "B" => Self::B,
            "C" => Self::C,
            "D" => Self::D,
            "E" => Self::E,
            _ => Self::A,
        }
    }
}

/// Niveau de sévérité, du plus faible au plus fort
#[derive(
    Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, Display,
)]
pub enum Severity {
    Low,
    Moderate,
    High,
}

/// Résultat brut d'une analyse, jamais stocké tel quel.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub deficiency_type: DeficiencyType,
    pub severity: Severity,
    pub confidence: u8,
    pub analysis_date: DateTime<Utc>,
}

/// Les données du patient recopiées dans le rapport au moment de sa création
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PatientInfo {
    pub id: UserID,
    pub name: String,
    pub email: String,
    pub age: u8,
}

impl From<&UserRecord> for PatientInfo {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            age: user.age,
        }
    }
}

/// Résultat d'analyse fusionné avec l'entrée de référence correspondante.
/// C'est une copie: modifier la table de référence ne change pas les
/// rapports déjà stockés.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeficiencyFinding {
    #[serde(rename = "type")]
    pub kind: DeficiencyType,
    pub name: String,
    pub severity: Severity,
    pub confidence: u8,
    pub symptoms: Vec<String>,
    pub causes: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Un rapport de carence, tel qu'il est stocké sous la clé `reportsHistory`
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: ReportID,
    pub created_at: DateTime<Utc>,
    pub patient: PatientInfo,
    pub image: ImagePayload,
    pub deficiency: DeficiencyFinding,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {} ({}, {} {})",
            self.id,
            self.deficiency.name,
            self.deficiency.severity,
            self.date(),
            self.time()
        )
    }
}

impl Report {
    /// Date de création, en heure locale
    pub fn date(&self) -> String {
        self.created_at
            .with_timezone(&Local)
            .format("%Y-%m-%d")
            .to_string()
    }

    /// Heure de création, en heure locale
    pub fn time(&self) -> String {
        self.created_at
            .with_timezone(&Local)
            .format("%H:%M:%S")
            .to_string()
    }
}
