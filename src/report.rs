//! Construction des rapports et de leur représentation affichable

use chrono::Utc;
use serde::Serialize;

use crate::imaging::ImagePayload;
use crate::models::{AnalysisResult, DeficiencyFinding, PatientInfo, Report, ReportID, Severity};
use crate::reference::reference;

pub const REPORT_TITLE: &str = "Vitamin Deficiency Detection";
pub const REPORT_SUBTITLE: &str = "Medical Report";
pub const DISCLAIMER: &str =
    "This report is generated by AI analysis and should be reviewed by a medical professional.";

/// Ce que l'appelant fournit en plus du résultat d'analyse
#[derive(Debug, Clone)]
pub struct ReportContext {
    pub patient: PatientInfo,
    pub image: ImagePayload,
}

/// Fusionne un résultat d'analyse avec la table de référence
pub fn build_report(result: &AnalysisResult, context: ReportContext) -> Report {
    let entry = reference(result.deficiency_type);

    Report {
        id: ReportID::new(),
        created_at: Utc::now(),
        patient: context.patient,
        image: context.image,
        deficiency: DeficiencyFinding {
            kind: result.deficiency_type,
            name: entry.name.to_owned(),
            severity: result.severity,
            confidence: result.confidence,
            symptoms: owned(entry.symptoms),
            causes: owned(entry.causes),
            recommendations: owned(entry.recommendations),
        },
    }
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Un rapport prêt à être affiché ou exporté, sans aucune mise en forme
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayDocument {
    pub report_id: String,
    pub header: HeaderBlock,
    pub patient: PatientBlock,
    pub image: ImageBlock,
    pub heading: String,
    pub badge: SeverityBadge,
    pub sections: Vec<Section>,
    pub disclaimer: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderBlock {
    pub title: String,
    pub subtitle: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatientBlock {
    pub id: String,
    pub name: String,
    pub age: u8,
    pub date: String,
    pub time: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageBlock {
    pub mime: String,
    pub data_url: String,
    pub alt: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeverityBadge {
    pub severity: Severity,
    pub confidence: u8,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub title: String,
    pub ordered: bool,
    pub items: Vec<String>,
}

/// Produit la représentation affichable d'un rapport. Fonction pure.
pub fn render(report: &Report) -> DisplayDocument {
    let finding = &report.deficiency;

    DisplayDocument {
        report_id: report.id.to_string(),
        header: HeaderBlock {
            title: REPORT_TITLE.to_owned(),
            subtitle: REPORT_SUBTITLE.to_owned(),
        },
        patient: PatientBlock {
            id: report.patient.id.to_string(),
            name: report.patient.name.clone(),
            age: report.patient.age,
            date: report.date(),
            time: report.time(),
        },
        image: ImageBlock {
            mime: report.image.mime().to_owned(),
            data_url: report.image.to_data_url(),
            alt: "Analyzed image".to_owned(),
        },
        heading: format!("{} Deficiency", finding.name),
        badge: SeverityBadge {
            severity: finding.severity,
            confidence: finding.confidence,
            label: format!(
                "{} severity ({}% confidence)",
                finding.severity, finding.confidence
            ),
        },
        sections: vec![
            Section {
                title: "Symptoms".to_owned(),
                ordered: false,
                items: finding.symptoms.clone(),
            },
            Section {
                title: "Possible Causes".to_owned(),
                ordered: false,
                items: finding.causes.clone(),
            },
            Section {
                title: "Recommendations".to_owned(),
                ordered: true,
                items: finding.recommendations.clone(),
            },
        ],
        disclaimer: DISCLAIMER.to_owned(),
    }
}
