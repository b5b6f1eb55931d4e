//! Historique des rapports, stocké sous la clé `reportsHistory`

use log::{info, warn};

use crate::db::{load_collection, save_collection, KeyValueStore, StorageError, REPORTS_KEY};
use crate::models::{Report, ReportID, UserID};

/// Copie en mémoire de l'historique, dans l'ordre d'insertion.
#[derive(Debug, Default)]
pub struct ReportHistory {
    reports: Vec<Report>,
}

impl ReportHistory {
    pub fn load<S: KeyValueStore + ?Sized>(store: &S) -> Result<Self, StorageError> {
        Ok(Self {
            reports: load_collection(store, REPORTS_KEY)?,
        })
    }

    /// Relit l'historique depuis le stockage, en écrasant la copie en mémoire
    pub fn reload<S: KeyValueStore + ?Sized>(&mut self, store: &S) -> Result<(), StorageError> {
        self.reports = load_collection(store, REPORTS_KEY)?;
        Ok(())
    }

    /// Ajoute un rapport en fin d'historique et réécrit tout l'historique
    pub fn persist<S: KeyValueStore + ?Sized>(
        &mut self,
        store: &mut S,
        report: Report,
    ) -> Result<(), StorageError> {
        info!("Storing report {} for patient {}", report.id, report.patient.id);
        self.reports.push(report);
        if let Err(e) = save_collection(store, REPORTS_KEY, &self.reports) {
            self.reports.pop();
            return Err(e);
        }
        Ok(())
    }

    pub fn find_by_id(&self, id: &ReportID) -> Option<&Report> {
        self.reports.iter().find(|report| &report.id == id)
    }

    /// Supprime les rapports portant cet identifiant et renvoie leur nombre.
    ///
    /// Le stockage n'est réécrit que si quelque chose a été supprimé.
    /// L'appelant doit avoir obtenu la confirmation de l'utilisateur.
    pub fn delete<S: KeyValueStore + ?Sized>(
        &mut self,
        store: &mut S,
        id: &ReportID,
    ) -> Result<usize, StorageError> {
        let before = self.reports.len();
        let kept: Vec<Report> = self
            .reports
            .iter()
            .filter(|report| &report.id != id)
            .cloned()
            .collect();
        let removed = before - kept.len();

        if removed == 0 {
            warn!("Report {id} not found, nothing deleted");
            return Ok(0);
        }

        save_collection(store, REPORTS_KEY, &kept)?;
        self.reports = kept;
        info!("Deleted report {id}");
        Ok(removed)
    }

    pub fn list(&self) -> impl Iterator<Item = &Report> + '_ {
        self.reports.iter()
    }

    pub fn list_for_patient(&self, patient: UserID) -> impl Iterator<Item = &Report> + '_ {
        self.reports
            .iter()
            .filter(move |report| report.patient.id == patient)
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }
}
