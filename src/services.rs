//! API de l'application, et point d'entrée unique du front-end.
//!
//! Le [`Service`] porte le contexte de session (l'utilisateur connecté) et
//! l'unique dépôt durable; toutes les opérations du pipeline passent par lui.

use std::{path::Path, thread, time::Duration};

use log::{info, warn};
use thiserror::Error;

use crate::analysis::Analyzer;
use crate::db::{KeyValueStore, StorageError};
use crate::export::{Artifact, DocumentExporter, ExportError, ExportFormat, PdfExporter, TextExporter};
use crate::history::ReportHistory;
use crate::imaging::{ImageDecoder, ImageError};
use crate::models::{PatientInfo, Report, ReportID, UserRecord};
use crate::profile::{ProfilePhotos, UserProfile};
use crate::report::{build_report, render, DisplayDocument, ReportContext};
use crate::users::{new_record, UserStore, UserStoreError};
use crate::utils::input_validation::{LoginForm, RegistrationForm, ValidationError};

pub struct Service {
    user: Option<UserRecord>,
    store: Box<dyn KeyValueStore>,
    users: UserStore,
    history: ReportHistory,
    photos: ProfilePhotos,
    analyzer: Box<dyn Analyzer>,
    decoder: Box<dyn ImageDecoder>,
    text: TextExporter,
    pdf: PdfExporter,
    latency: Duration,
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Email already registered. Please login instead.")]
    DuplicateEmail,

    #[error(transparent)]
    Login(#[from] LoginError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Image(#[from] ImageError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("Please login first")]
    NotLoggedIn,

    #[error("Report not found")]
    NoSuchReport,
}

impl From<UserStoreError> for ServiceError {
    fn from(e: UserStoreError) -> Self {
        match e {
            UserStoreError::EmailAlreadyExists { .. } => ServiceError::DuplicateEmail,
            UserStoreError::Storage(e) => ServiceError::Storage(e),
        }
    }
}

#[derive(Debug, Error)]
pub enum LoginError {
    #[error("Invalid email or password")]
    InvalidCredentials,
}

impl Service {
    /// Charge les deux collections et garantit la présence du compte de démo
    pub fn new(
        mut store: Box<dyn KeyValueStore>,
        analyzer: Box<dyn Analyzer>,
        decoder: Box<dyn ImageDecoder>,
    ) -> Result<Self, ServiceError> {
        let mut users = UserStore::load(store.as_ref())?;
        users.seed_default_account(store.as_mut())?;
        let history = ReportHistory::load(store.as_ref())?;
        let photos = ProfilePhotos::load(store.as_ref())?;

        Ok(Self {
            user: None,
            store,
            users,
            history,
            photos,
            analyzer,
            decoder,
            text: TextExporter::new()?,
            pdf: PdfExporter,
            latency: Duration::ZERO,
        })
    }

    /// Délai simulé avant chaque connexion et chaque analyse, en attendant un
    /// vrai service distant
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Enregistre un nouveau compte. Rien n'est écrit si la saisie est invalide.
    pub fn register(&mut self, form: &RegistrationForm) -> Result<UserRecord, ServiceError> {
        let candidate = new_record(form.validate()?);
        self.users.register(self.store.as_mut(), candidate.clone())?;
        Ok(candidate)
    }

    /// Vérifie les identifiants et, si ils sont corrects, ouvre la session.
    pub fn login(&mut self, form: &LoginForm) -> Result<&UserRecord, ServiceError> {
        let email = form.validate()?;
        self.wait();

        let Some(user) = self.users.authenticate(&email, &form.password) else {
            warn!("Failed login attempt for {email}");
            return Err(LoginError::InvalidCredentials.into());
        };

        info!("User {} logged in", user.email);
        Ok(self.user.insert(user.clone()))
    }

    /// Ferme la session
    pub fn logout(&mut self) {
        self.user = None
    }

    pub fn current_user(&self) -> Option<&UserRecord> {
        self.user.as_ref()
    }

    fn wait(&self) {
        if !self.latency.is_zero() {
            thread::sleep(self.latency);
        }
    }

    fn subject(&self) -> Result<&UserRecord, ServiceError> {
        self.user.as_ref().ok_or(ServiceError::NotLoggedIn)
    }

    /// La fiche de l'utilisateur connecté
    pub fn profile(&self) -> Result<UserProfile, ServiceError> {
        let user = self.subject()?;
        Ok(UserProfile::new(user, self.photos.get(user.id)))
    }

    /// Remplace la photo de profil de l'utilisateur connecté.
    /// Le fichier doit être une image.
    pub fn set_profile_photo(&mut self, path: &Path) -> Result<(), ServiceError> {
        let user = self.subject()?.id;
        let image = self.decoder.decode(path)?;
        self.photos.set(self.store.as_mut(), user, image)?;
        Ok(())
    }

    /// Lit l'image, l'analyse, construit le rapport et l'ajoute à l'historique
    pub fn analyze_image(&mut self, path: &Path) -> Result<Report, ServiceError> {
        let patient = PatientInfo::from(self.subject()?);
        let image = self.decoder.decode(path)?;
        self.wait();

        let result = self.analyzer.analyze(&image);
        let report = build_report(&result, ReportContext { patient, image });
        self.history.persist(self.store.as_mut(), report.clone())?;

        info!(
            "Report {} generated: {} ({}, {}%)",
            report.id, report.deficiency.name, report.deficiency.severity, report.deficiency.confidence
        );
        Ok(report)
    }

    /// Les rapports de l'utilisateur connecté, du plus ancien au plus récent
    pub fn reports(&self) -> impl Iterator<Item = &Report> + '_ {
        self.user
            .iter()
            .flat_map(|user| self.history.list_for_patient(user.id))
    }

    /// Un rapport de l'utilisateur connecté
    pub fn report(&self, id: &ReportID) -> Result<&Report, ServiceError> {
        let user = self.subject()?;
        self.history
            .find_by_id(id)
            .filter(|report| report.patient.id == user.id)
            .ok_or(ServiceError::NoSuchReport)
    }

    pub fn render(&self, id: &ReportID) -> Result<DisplayDocument, ServiceError> {
        Ok(render(self.report(id)?))
    }

    pub fn export(&self, id: &ReportID, format: ExportFormat) -> Result<Artifact, ServiceError> {
        let document = self.render(id)?;
        let artifact = match format {
            ExportFormat::Text => self.text.artifact(&document)?,
            ExportFormat::Pdf => self.pdf.artifact(&document)?,
        };

        info!("Exported report {id} as {}", artifact.file_name);
        Ok(artifact)
    }

    /// Supprime un rapport de l'utilisateur connecté.
    ///
    /// La confirmation de l'utilisateur doit avoir été obtenue avant l'appel.
    /// Supprimer un rapport inexistant ne fait rien.
    pub fn delete_report(&mut self, id: &ReportID) -> Result<usize, ServiceError> {
        let user = self.subject()?.id;
        if self
            .history
            .find_by_id(id)
            .is_some_and(|report| report.patient.id != user)
        {
            return Err(ServiceError::NoSuchReport);
        }

        Ok(self.history.delete(self.store.as_mut(), id)?)
    }

    /// Relit les comptes, l'historique et les photos depuis le stockage
    pub fn reload(&mut self) -> Result<(), ServiceError> {
        self.users = UserStore::load(self.store.as_ref())?;
        self.history.reload(self.store.as_ref())?;
        self.photos = ProfilePhotos::load(self.store.as_ref())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AnalysisPolicy, RandomAnalyzer};
    use crate::db::{load_collection, MemoryStore, PROFILE_IMAGE_KEY, USERS_KEY};
    use crate::imaging::{tests::PNG_MAGIC, ImagePayload};
    use crate::models::{DeficiencyType, Severity};
    use crate::users::{DEMO_EMAIL, DEMO_PASSWORD};

    /// Renvoie toujours la même image, quel que soit le chemin
    struct FakeDecoder;

    impl ImageDecoder for FakeDecoder {
        fn decode(&self, path: &Path) -> Result<ImagePayload, ImageError> {
            if path.ends_with("missing.png") {
                return Err(ImageError::NotAnImage);
            }
            ImagePayload::from_bytes(PNG_MAGIC)
        }
    }

    /// Partage le stockage entre le service et le test
    #[derive(Clone, Default)]
    struct SharedStore(std::rc::Rc<std::cell::RefCell<MemoryStore>>);

    impl KeyValueStore for SharedStore {
        fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.0.borrow().get(key)
        }

        fn set(&mut self, key: &str, value: String) -> Result<(), StorageError> {
            self.0.borrow_mut().set(key, value)
        }
    }

    fn service_with(store: SharedStore) -> Service {
        let analyzer = RandomAnalyzer::new(
            AnalysisPolicy::Fixed(DeficiencyType::D, Severity::Low),
            70..100,
        )
        .unwrap();
        Service::new(Box::new(store), Box::new(analyzer), Box::new(FakeDecoder)).unwrap()
    }

    fn service() -> Service {
        service_with(SharedStore::default())
    }

    fn alice() -> RegistrationForm {
        RegistrationForm {
            name: "Alice Smith".into(),
            email: "alice@example.com".into(),
            phone: "0123456789".into(),
            age: "25".into(),
            password: "secret123".into(),
            confirm_password: "secret123".into(),
        }
    }

    fn login_as(service: &mut Service, email: &str, password: &str) {
        service
            .login(&LoginForm {
                email: email.into(),
                password: password.into(),
            })
            .unwrap();
    }

    mod account_tests {
        use super::*;

        #[test]
        fn test_demo_account_can_login() {
            let mut service = service();
            login_as(&mut service, DEMO_EMAIL, DEMO_PASSWORD);
            assert_eq!(service.current_user().unwrap().email, DEMO_EMAIL);
        }

        #[test]
        fn test_invalid_registration_writes_nothing() {
            let store = SharedStore::default();
            let mut service = service_with(store.clone());
            let writes = store.0.borrow().writes();

            let form = RegistrationForm {
                name: "Al".into(),
                email: "not-an-email".into(),
                ..alice()
            };
            assert!(matches!(
                service.register(&form),
                Err(ServiceError::Validation(ValidationError::InvalidName))
            ));
            assert_eq!(store.0.borrow().writes(), writes);
        }

        #[test]
        fn test_valid_registration_persists_user() {
            let store = SharedStore::default();
            let mut service = service_with(store.clone());

            let user = service.register(&alice()).unwrap();
            assert_eq!(user.age, 25);

            let stored: Vec<UserRecord> = load_collection(&store, USERS_KEY).unwrap();
            assert_eq!(stored.len(), 2, "Expected the demo account plus Alice");
            assert!(stored.iter().any(|u| u.email == "alice@example.com" && u.age == 25));
        }

        #[test]
        fn test_duplicate_registration() {
            let mut service = service();
            service.register(&alice()).unwrap();
            assert!(matches!(
                service.register(&alice()),
                Err(ServiceError::DuplicateEmail)
            ));
        }

        #[test]
        fn test_login_failures_are_generic() {
            let mut service = service();
            service.register(&alice()).unwrap();

            let wrong_password = service
                .login(&LoginForm {
                    email: "alice@example.com".into(),
                    password: "wrongpass".into(),
                })
                .unwrap_err()
                .to_string();
            let unknown_email = service
                .login(&LoginForm {
                    email: "nobody@example.com".into(),
                    password: "secret123".into(),
                })
                .unwrap_err()
                .to_string();

            assert_eq!(wrong_password, unknown_email);
            assert!(service.current_user().is_none());
        }

        #[test]
        fn test_login_waits_for_latency() {
            let mut service = service().with_latency(Duration::from_millis(50));
            let start = std::time::Instant::now();
            login_as(&mut service, DEMO_EMAIL, DEMO_PASSWORD);
            assert!(start.elapsed() >= Duration::from_millis(50));
        }

        #[test]
        fn test_profile_requires_login() {
            let mut service = service();
            assert!(matches!(service.profile(), Err(ServiceError::NotLoggedIn)));
            assert!(matches!(
                service.set_profile_photo(Path::new("me.png")),
                Err(ServiceError::NotLoggedIn)
            ));
        }

        #[test]
        fn test_profile_shows_account_details() {
            let mut service = service();
            service.register(&alice()).unwrap();
            login_as(&mut service, "alice@example.com", "secret123");

            let profile = service.profile().unwrap();
            assert_eq!(profile.name, "Alice Smith");
            assert_eq!(profile.email, "alice@example.com");
            assert_eq!(profile.phone, "0123456789");
            assert_eq!(profile.age, 25);
            assert!(profile.photo.is_none());
        }

        #[test]
        fn test_profile_photo_is_persisted() {
            let store = SharedStore::default();
            let mut service = service_with(store.clone());
            login_as(&mut service, DEMO_EMAIL, DEMO_PASSWORD);

            service.set_profile_photo(Path::new("me.png")).unwrap();
            assert_eq!(
                service.profile().unwrap().photo.unwrap().mime(),
                "image/png"
            );
            assert!(store.get(PROFILE_IMAGE_KEY).unwrap().is_some());

            let mut fresh = service_with(store);
            login_as(&mut fresh, DEMO_EMAIL, DEMO_PASSWORD);
            assert!(fresh.profile().unwrap().photo.is_some());
        }

        #[test]
        fn test_non_image_profile_photo_is_rejected() {
            let store = SharedStore::default();
            let mut service = service_with(store.clone());
            login_as(&mut service, DEMO_EMAIL, DEMO_PASSWORD);

            assert!(matches!(
                service.set_profile_photo(Path::new("missing.png")),
                Err(ServiceError::Image(_))
            ));
            assert!(store.get(PROFILE_IMAGE_KEY).unwrap().is_none());
        }

        #[test]
        fn test_logout() {
            let mut service = service();
            login_as(&mut service, DEMO_EMAIL, DEMO_PASSWORD);
            service.logout();
            assert!(service.current_user().is_none());
        }
    }

    mod report_tests {
        use super::*;

        #[test]
        fn test_analysis_requires_login() {
            let mut service = service();
            assert!(matches!(
                service.analyze_image(Path::new("scan.png")),
                Err(ServiceError::NotLoggedIn)
            ));
        }

        #[test]
        fn test_analysis_creates_and_persists_report() {
            let store = SharedStore::default();
            let mut service = service_with(store.clone());
            login_as(&mut service, DEMO_EMAIL, DEMO_PASSWORD);

            let report = service.analyze_image(Path::new("scan.png")).unwrap();
            assert_eq!(report.deficiency.name, "Vitamin D");
            assert_eq!(report.patient.name, "Detector");

            let mut fresh = service_with(store);
            login_as(&mut fresh, DEMO_EMAIL, DEMO_PASSWORD);
            assert_eq!(fresh.report(&report.id).unwrap(), &report);
        }

        #[test]
        fn test_unreadable_image_aborts() {
            let mut service = service();
            login_as(&mut service, DEMO_EMAIL, DEMO_PASSWORD);
            assert!(matches!(
                service.analyze_image(Path::new("missing.png")),
                Err(ServiceError::Image(_))
            ));
            assert_eq!(service.reports().count(), 0);
        }

        #[test]
        fn test_reports_are_private() {
            let mut service = service();
            service.register(&alice()).unwrap();
            login_as(&mut service, DEMO_EMAIL, DEMO_PASSWORD);
            let report = service.analyze_image(Path::new("scan.png")).unwrap();

            login_as(&mut service, "alice@example.com", "secret123");
            assert_eq!(service.reports().count(), 0);
            assert!(matches!(
                service.report(&report.id),
                Err(ServiceError::NoSuchReport)
            ));
            assert!(matches!(
                service.delete_report(&report.id),
                Err(ServiceError::NoSuchReport)
            ));
        }

        #[test]
        fn test_delete_report() {
            let mut service = service();
            login_as(&mut service, DEMO_EMAIL, DEMO_PASSWORD);
            let report = service.analyze_image(Path::new("scan.png")).unwrap();

            assert_eq!(service.delete_report(&report.id).unwrap(), 1);
            assert_eq!(service.delete_report(&report.id).unwrap(), 0);
            assert!(matches!(
                service.report(&report.id),
                Err(ServiceError::NoSuchReport)
            ));
        }

        #[test]
        fn test_export_both_formats() {
            let mut service = service();
            login_as(&mut service, DEMO_EMAIL, DEMO_PASSWORD);
            let report = service.analyze_image(Path::new("scan.png")).unwrap();

            let text = service.export(&report.id, ExportFormat::Text).unwrap();
            assert!(text.file_name.contains(report.id.as_ref()));
            assert!(String::from_utf8(text.bytes).unwrap().contains("Vitamin D"));

            let pdf = service.export(&report.id, ExportFormat::Pdf).unwrap();
            assert!(pdf.bytes.starts_with(b"%PDF"));
        }

        #[test]
        fn test_reload_sees_other_writers() {
            let store = SharedStore::default();
            let mut first = service_with(store.clone());
            let mut second = service_with(store);
            login_as(&mut first, DEMO_EMAIL, DEMO_PASSWORD);
            login_as(&mut second, DEMO_EMAIL, DEMO_PASSWORD);

            let report = first.analyze_image(Path::new("scan.png")).unwrap();
            assert!(second.report(&report.id).is_err());

            second.reload().unwrap();
            assert!(second.report(&report.id).is_ok());
        }
    }
}
