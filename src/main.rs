use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Result;
use derive_more::Display;
use dotenv::dotenv;
use inquire::{Confirm, Password, PasswordDisplayMode, Select, Text};
use strum::IntoEnumIterator;
use strum_macros::EnumIter;
use vitadetect::analysis::RandomAnalyzer;
use vitadetect::config::Config;
use vitadetect::db::JsonFileStore;
use vitadetect::export::ExportFormat;
use vitadetect::imaging::FileImageDecoder;
use vitadetect::models::{Report, ReportID};
use vitadetect::profile::UserProfile;
use vitadetect::report::DisplayDocument;
use vitadetect::services::{Service, ServiceError};
use vitadetect::utils::input_validation::{LoginForm, RegistrationForm};

type MenuExit = Option<()>;
const MENU_EXIT: MenuExit = None;
const MENU_LOOP: MenuExit = Some(());

/// Représente un menu texte
trait Menu {
    /// Implémente le contenu du menu. La valeur de retour
    /// doit être None si le menu souhaite terminer,
    /// ou Some(()) s'il faut le relancer.
    fn enter(&mut self) -> Result<MenuExit>;

    /// Lance le menu en boucle, en interceptant les erreurs,
    /// sauf si le menu souhaite quitter.
    fn enter_loop(&mut self) {
        while let Some(result) = self.enter().transpose() {
            if let Err(error) = result {
                eprintln!("Error: {error}");
            }
        }
    }
}

fn password(message: &str) -> Result<String> {
    Ok(Password::new(message)
        .without_confirmation()
        .with_display_mode(PasswordDisplayMode::Masked)
        .prompt()?)
}

pub struct App {
    service: Service,
    export_dir: PathBuf,
}

impl App {
    pub fn new(service: Service, export_dir: PathBuf) -> Self {
        App {
            service,
            export_dir,
        }
    }

    pub fn start(&mut self) -> Result<()> {
        println!("Welcome to the Vitamin Deficiency Detector.");
        self.enter_loop();
        Ok(())
    }

    fn register(&mut self) -> Result<()> {
        let form = RegistrationForm {
            name: Text::new("Full name:").prompt()?,
            email: Text::new("Email:").prompt()?,
            phone: Text::new("Phone number (10 digits):").prompt()?,
            age: Text::new("Age:").prompt()?,
            password: password("Password:")?,
            confirm_password: password("Confirm password:")?,
        };

        match self.service.register(&form) {
            Ok(user) => {
                println!("Registration successful, you can now login as {}.", user.email);
                Ok(())
            }
            Err(ServiceError::DuplicateEmail) => {
                println!("{}", ServiceError::DuplicateEmail);
                self.login()
            }
            Err(e) => Err(e.into()),
        }
    }

    fn login(&mut self) -> Result<()> {
        let form = LoginForm {
            email: Text::new("Email:").prompt()?,
            password: password("Password:")?,
        };

        let user = self.service.login(&form)?;
        println!("[*] Welcome, {}.", user.name);

        UserMenu {
            service: &mut self.service,
            export_dir: &self.export_dir,
        }
        .enter_loop();
        self.service.logout();
        Ok(())
    }
}

impl Menu for App {
    fn enter(&mut self) -> Result<MenuExit> {
        #[derive(EnumIter, Display)]
        enum Choice {
            #[display("Login")]
            Login,
            #[display("Create an account")]
            Register,
            #[display("Quit")]
            Exit,
        }

        let choice = Select::new("What do you want to do?", Choice::iter().collect()).prompt()?;

        match choice {
            Choice::Login => self.login()?,
            Choice::Register => self.register()?,
            Choice::Exit => return Ok(MENU_EXIT),
        }
        Ok(MENU_LOOP)
    }
}

struct UserMenu<'srv> {
    service: &'srv mut Service,
    export_dir: &'srv PathBuf,
}

impl Menu for UserMenu<'_> {
    fn enter(&mut self) -> Result<MenuExit> {
        #[derive(EnumIter, Display)]
        enum Choice {
            #[display("Analyze an image")]
            Analyze,
            #[display("My reports")]
            History,
            #[display("My profile")]
            Profile,
            #[display("Logout")]
            Logout,
        }

        let choice = Select::new("What do you want to do?", Choice::iter().collect()).prompt()?;
        match choice {
            Choice::Analyze => {
                let path = Text::new("Path of the image to analyze:").prompt()?;
                println!("Analyzing...");
                let report = self.service.analyze_image(Path::new(path.trim()))?;
                print_document(&self.service.render(&report.id)?);
            }

            Choice::History => ReportsMenu {
                service: &mut *self.service,
                export_dir: self.export_dir,
            }
            .enter_loop(),

            Choice::Profile => {
                print_profile(&self.service.profile()?);
                if Confirm::new("Change your profile photo?")
                    .with_default(false)
                    .prompt()?
                {
                    let path = Text::new("Path of the new photo:").prompt()?;
                    self.service.set_profile_photo(Path::new(path.trim()))?;
                    println!("[*] Profile photo updated successfully");
                }
            }

            Choice::Logout => return Ok(MENU_EXIT),
        }
        Ok(MENU_LOOP)
    }
}

struct ReportsMenu<'srv> {
    service: &'srv mut Service,
    export_dir: &'srv PathBuf,
}

impl ReportsMenu<'_> {
    fn download(&self, id: &ReportID, format: ExportFormat) -> Result<()> {
        let artifact = self.service.export(id, format)?;
        let path = self.export_dir.join(&artifact.file_name);
        fs::write(&path, &artifact.bytes)?;
        println!("[*] Report saved to {}", path.display());
        Ok(())
    }
}

impl Menu for ReportsMenu<'_> {
    fn enter(&mut self) -> Result<MenuExit> {
        #[derive(EnumIter, Display)]
        enum Action {
            #[display("View")]
            View,
            #[display("Download")]
            Download,
            #[display("Delete")]
            Delete,
            #[display("Back")]
            Back,
        }

        // Les plus récents d'abord
        let mut reports: Vec<&Report> = self.service.reports().collect();
        reports.reverse();

        if reports.is_empty() {
            println!("[*] No reports yet");
            return Ok(MENU_EXIT);
        }

        let Some(report) = Select::new("Choose a report:", reports).prompt_skippable()? else {
            return Ok(MENU_EXIT);
        };
        let id = report.id.clone();

        match Select::new("Action:", Action::iter().collect()).prompt()? {
            Action::View => print_document(&self.service.render(&id)?),

            Action::Download => {
                let format = Select::new("Format:", ExportFormat::iter().collect()).prompt()?;
                self.download(&id, format)?;
            }

            Action::Delete => {
                if Confirm::new("Are you sure you want to delete this report?")
                    .with_help_message("This action cannot be undone.")
                    .with_default(false)
                    .prompt()?
                {
                    self.service.delete_report(&id)?;
                    println!("[*] Report deleted successfully");
                }
            }

            Action::Back => return Ok(MENU_EXIT),
        }
        Ok(MENU_LOOP)
    }
}

fn print_profile(profile: &UserProfile) {
    println!("\n=== My profile ===");
    println!(
        "Name: {}\nEmail: {}\nPhone: {}\nAge: {}",
        profile.name, profile.email, profile.phone, profile.age
    );
    match &profile.photo {
        Some(photo) => println!("Photo: {} ({} bytes)", photo.mime(), photo.byte_len()),
        None => println!("Photo: none"),
    }
}

fn print_document(doc: &DisplayDocument) {
    println!("\n=== {} - {} ===", doc.header.title, doc.header.subtitle);
    println!(
        "Patient Name: {}\nAge: {}\nDate: {}\nTime: {}\nReport ID: {}",
        doc.patient.name, doc.patient.age, doc.patient.date, doc.patient.time, doc.report_id
    );
    println!("{}: {}\n", doc.image.alt, doc.image.mime);
    println!("{}\n{}", doc.heading, doc.badge.label);

    for section in &doc.sections {
        println!("\n{}:", section.title);
        for (i, item) in section.items.iter().enumerate() {
            if section.ordered {
                println!("  {}. {item}", i + 1);
            } else {
                println!("  - {item}");
            }
        }
    }

    println!("\nDisclaimer: {}\n===============", doc.disclaimer);
}

fn main() -> Result<()> {
    dotenv().ok();
    let config = Config::from_env()?;
    simple_logging::log_to_file(&config.log_path, log::LevelFilter::Info)?;

    let store = JsonFileStore::open(config.db_path.clone())?;
    let analyzer = RandomAnalyzer::new(config.policy, config.confidence.clone())?;
    let service = Service::new(
        Box::new(store),
        Box::new(analyzer),
        Box::new(FileImageDecoder),
    )?
    .with_latency(config.latency);

    App::new(service, config.export_dir).start()
}
