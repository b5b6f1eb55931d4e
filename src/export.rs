//! Export des rapports en fichiers téléchargeables.
//!
//! Le pipeline fournit seulement le contenu ([`DisplayDocument`]); la mise en
//! page est du ressort de chaque [`DocumentExporter`].

use std::io::BufWriter;

use derive_more::Display;
use handlebars::Handlebars;
use log::warn;
use printpdf::image_crate::{self, DynamicImage, GenericImageView};
use printpdf::{
    BuiltinFont, Image, ImageTransform, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference,
};
use serde::Serialize;
use strum_macros::EnumIter;
use thiserror::Error;

use crate::imaging::ImagePayload;
use crate::report::{DisplayDocument, ImageBlock, PatientBlock, SeverityBadge};

pub const PDF_FOOTER: &str = "Generated by Vitamin Deficiency Detector";

const TEXT_TEMPLATE_NAME: &str = "report";
const TEXT_TEMPLATE: &str = r#"Vitamin Deficiency Analysis Report

Patient: {{patient.name}} (ID: {{patient.id}})
Age: {{patient.age}}
Report ID: {{report_id}}
Date: {{patient.date}} {{patient.time}}
Image: {{image.mime}}

Deficiency: {{heading}}
{{badge.label}}
{{#each sections}}

{{title}}:
{{#each lines}}
{{this}}
{{/each}}
{{/each}}

Disclaimer: {{disclaimer}}
"#;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to prepare the report template: {0}")]
    Template(#[from] Box<handlebars::TemplateError>),
    #[error("Failed to render the report: {0}")]
    Render(#[from] handlebars::RenderError),
    #[error("Failed to generate PDF: {0}")]
    Pdf(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, Display)]
pub enum ExportFormat {
    #[display("Plain text")]
    Text,
    #[display("PDF")]
    Pdf,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Text => "txt",
            ExportFormat::Pdf => "pdf",
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            ExportFormat::Text => "text/plain",
            ExportFormat::Pdf => "application/pdf",
        }
    }
}

/// Le fichier produit par un export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub file_name: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

impl Artifact {
    pub fn file_name_for(report_id: &str, format: ExportFormat) -> String {
        format!("vitamin_report_{report_id}.{}", format.extension())
    }
}

/// Transforme un document affichable en octets d'un format donné
pub trait DocumentExporter {
    fn format(&self) -> ExportFormat;
    fn export(&self, document: &DisplayDocument) -> Result<Vec<u8>, ExportError>;

    fn artifact(&self, document: &DisplayDocument) -> Result<Artifact, ExportError> {
        let format = self.format();
        Ok(Artifact {
            file_name: Artifact::file_name_for(&document.report_id, format),
            mime: format.mime(),
            bytes: self.export(document)?,
        })
    }
}

#[derive(Serialize)]
struct TextSection<'a> {
    title: &'a str,
    lines: Vec<String>,
}

#[derive(Serialize)]
struct TextView<'a> {
    report_id: &'a str,
    patient: &'a PatientBlock,
    image: &'a ImageBlock,
    heading: &'a str,
    badge: &'a SeverityBadge,
    sections: Vec<TextSection<'a>>,
    disclaimer: &'a str,
}

/// Numérote les listes ordonnées, met des tirets aux autres
fn section_lines(ordered: bool, items: &[String]) -> Vec<String> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            if ordered {
                format!("{}. {item}", i + 1)
            } else {
                format!("- {item}")
            }
        })
        .collect()
}

/// Transcription texte du rapport
pub struct TextExporter {
    hbs: Handlebars<'static>,
}

impl TextExporter {
    pub fn new() -> Result<Self, ExportError> {
        let mut hbs = Handlebars::new();
        hbs.register_escape_fn(handlebars::no_escape);
        hbs.set_strict_mode(true);
        hbs.register_template_string(TEXT_TEMPLATE_NAME, TEXT_TEMPLATE)
            .map_err(Box::new)?;
        Ok(Self { hbs })
    }

    pub fn render_text(&self, document: &DisplayDocument) -> Result<String, ExportError> {
        let view = TextView {
            report_id: &document.report_id,
            patient: &document.patient,
            image: &document.image,
            heading: &document.heading,
            badge: &document.badge,
            disclaimer: &document.disclaimer,
            sections: document
                .sections
                .iter()
                .map(|s| TextSection {
                    title: &s.title,
                    lines: section_lines(s.ordered, &s.items),
                })
                .collect(),
        };
        Ok(self.hbs.render(TEXT_TEMPLATE_NAME, &view)?)
    }
}

impl DocumentExporter for TextExporter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Text
    }

    fn export(&self, document: &DisplayDocument) -> Result<Vec<u8>, ExportError> {
        Ok(self.render_text(document)?.into_bytes())
    }
}

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 20.0;
const BOTTOM_LIMIT: f32 = 25.0;
/// Côté du carré dans lequel l'image analysée est mise à l'échelle
const IMAGE_BOX: f32 = 60.0;
/// Résolution par défaut de printpdf pour les images
const IMAGE_DPI: f32 = 300.0;

/// Document A4 paginé
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfExporter;

/// Curseur d'écriture qui passe à la page suivante quand la page est pleine
struct PdfWriter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    font: IndirectFontRef,
    bold: IndirectFontRef,
    y: Mm,
}

impl PdfWriter {
    fn new(title: &str) -> Result<Self, ExportError> {
        let (doc, page, layer) =
            PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        let layer = doc.get_page(page).get_layer(layer);
        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| ExportError::Pdf(format!("PDF font error: {e}")))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| ExportError::Pdf(format!("PDF font error: {e}")))?;

        let writer = Self {
            doc,
            layer,
            font,
            bold,
            y: Mm(PAGE_HEIGHT - MARGIN),
        };
        writer.footer();
        Ok(writer)
    }

    fn footer(&self) {
        self.layer
            .use_text(PDF_FOOTER, 8.0, Mm(PAGE_WIDTH / 2.0 - 30.0), Mm(10.0), &self.font);
    }

    fn ensure_room(&mut self, needed: f32) {
        if self.y.0 - needed < BOTTOM_LIMIT {
            let (page, layer) = self.doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = Mm(PAGE_HEIGHT - MARGIN);
            self.footer();
        }
    }

    fn line(&mut self, text: &str, size: f32, indent: f32, bold: bool, advance: f32) {
        self.ensure_room(advance);
        let font = if bold { &self.bold } else { &self.font };
        self.layer
            .use_text(text, size, Mm(MARGIN + indent), self.y, font);
        self.y -= Mm(advance);
    }

    fn wrapped(&mut self, text: &str, size: f32, indent: f32, max_chars: usize) {
        for line in wrap_text(text, max_chars) {
            self.line(&line, size, indent, false, 4.5);
        }
    }

    fn image(&mut self, picture: &DynamicImage) {
        let native_w = picture.width() as f32 * 25.4 / IMAGE_DPI;
        let native_h = picture.height() as f32 * 25.4 / IMAGE_DPI;
        let scale = (IMAGE_BOX / native_w).min(IMAGE_BOX / native_h);
        let height = native_h * scale;

        self.ensure_room(height + 3.0);
        self.y -= Mm(height);
        // Aplatie en RGB 8 bits, quel que soit le format source
        Image::from_dynamic_image(&DynamicImage::ImageRgb8(picture.to_rgb8())).add_to_layer(
            self.layer.clone(),
            ImageTransform {
                translate_x: Some(Mm(MARGIN)),
                translate_y: Some(self.y),
                scale_x: Some(scale),
                scale_y: Some(scale),
                dpi: Some(IMAGE_DPI),
                ..Default::default()
            },
        );
        self.y -= Mm(3.0);
    }

    fn gap(&mut self, mm: f32) {
        self.y -= Mm(mm);
    }

    fn finish(self) -> Result<Vec<u8>, ExportError> {
        let mut buf = BufWriter::new(Vec::new());
        self.doc
            .save(&mut buf)
            .map_err(|e| ExportError::Pdf(format!("PDF save error: {e}")))?;
        buf.into_inner()
            .map_err(|e| ExportError::Pdf(format!("PDF buffer error: {e}")))
    }
}

impl DocumentExporter for PdfExporter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Pdf
    }

    fn export(&self, document: &DisplayDocument) -> Result<Vec<u8>, ExportError> {
        let mut pdf = PdfWriter::new(&document.header.title)?;

        pdf.line(&document.header.title, 16.0, 0.0, true, 8.0);
        pdf.line(&document.header.subtitle, 12.0, 0.0, true, 10.0);

        let patient = &document.patient;
        pdf.line(&format!("Patient Name: {}", patient.name), 10.0, 0.0, false, 5.0);
        pdf.line(&format!("Age: {}", patient.age), 10.0, 0.0, false, 5.0);
        pdf.line(&format!("Date: {}", patient.date), 10.0, 0.0, false, 5.0);
        pdf.line(&format!("Time: {}", patient.time), 10.0, 0.0, false, 5.0);
        pdf.line(&format!("Report ID: {}", document.report_id), 10.0, 0.0, false, 5.0);
        match decode_image(&document.image) {
            Ok(picture) => {
                pdf.line(&format!("{}:", document.image.alt), 10.0, 0.0, false, 5.0);
                pdf.image(&picture);
            }
            Err(e) => {
                warn!("Image of report {} not embedded: {e}", document.report_id);
                pdf.line(
                    &format!("{}: {}", document.image.alt, document.image.mime),
                    10.0,
                    0.0,
                    false,
                    5.0,
                );
            }
        }
        pdf.gap(5.0);

        pdf.line(&document.heading, 13.0, 0.0, true, 7.0);
        pdf.line(&document.badge.label, 10.0, 0.0, false, 8.0);

        for section in &document.sections {
            pdf.line(&format!("{}:", section.title), 11.0, 0.0, true, 6.0);
            for line in section_lines(section.ordered, &section.items) {
                pdf.wrapped(&line, 9.0, 5.0, 90);
            }
            pdf.gap(3.0);
        }

        pdf.gap(5.0);
        pdf.wrapped(&format!("Disclaimer: {}", document.disclaimer), 8.0, 0.0, 110);

        pdf.finish()
    }
}

fn decode_image(block: &ImageBlock) -> Result<DynamicImage, String> {
    let bytes = ImagePayload::parse_data_url(&block.data_url)
        .and_then(|payload| payload.bytes())
        .map_err(|e| e.to_string())?;
    image_crate::load_from_memory(&bytes).map_err(|e| e.to_string())
}

fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.len() + word.len() + 1 > max_chars && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DeficiencyType;
    use crate::report::tests::{context, result};
    use crate::report::{build_report, render};

    fn document() -> DisplayDocument {
        render(&build_report(&result(DeficiencyType::B), context()))
    }

    /// Un document dont l'image est un vrai PNG décodable
    fn document_with_picture() -> DisplayDocument {
        let picture = image::RgbImage::from_pixel(8, 8, image::Rgb([200, 40, 40]));
        let mut png = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(picture)
            .write_to(&mut png, image::ImageFormat::Png)
            .unwrap();

        let mut doc = document();
        doc.image.data_url = ImagePayload::from_bytes(png.get_ref()).unwrap().to_data_url();
        doc
    }

    /// Dictionnaires PDF sans espaces, pour des recherches simples
    fn pdf_objects(bytes: &[u8]) -> String {
        String::from_utf8_lossy(bytes).split_whitespace().collect()
    }

    fn page_count(bytes: &[u8]) -> usize {
        let objects = pdf_objects(bytes);
        objects.matches("/Type/Page").count() - objects.matches("/Type/Pages").count()
    }

    #[test]
    fn test_text_transcript() {
        let doc = document();
        let text = TextExporter::new().unwrap().render_text(&doc).unwrap();

        assert!(text.starts_with("Vitamin Deficiency Analysis Report"));
        assert!(text.contains("Patient: Alice Smith"));
        assert!(text.contains(&format!("Report ID: {}", doc.report_id)));
        assert!(text.contains("Deficiency: Vitamin B Deficiency"));
        assert!(text.contains("High severity (91% confidence)"));
        assert!(text.contains("- Fatigue and weakness"));
        assert!(text.contains("1. Consume more B-vitamin rich foods"));
        assert!(text.contains("5. Limit alcohol consumption"));
        assert!(text.contains("Disclaimer:"));
        assert!(!text.contains("data:image"), "Image payload leaked into the transcript");
    }

    #[test]
    fn test_text_is_not_html_escaped() {
        let doc = document();
        let text = TextExporter::new().unwrap().render_text(&doc).unwrap();
        assert!(text.contains("hands/feet"));
        assert!(!text.contains("&#x2F;"));
    }

    #[test]
    fn test_artifact_naming() {
        let doc = document();
        let artifact = TextExporter::new().unwrap().artifact(&doc).unwrap();
        assert_eq!(artifact.file_name, format!("vitamin_report_{}.txt", doc.report_id));
        assert_eq!(artifact.mime, "text/plain");

        let pdf = PdfExporter.artifact(&doc).unwrap();
        assert_eq!(pdf.file_name, format!("vitamin_report_{}.pdf", doc.report_id));
        assert_eq!(pdf.mime, "application/pdf");
    }

    #[test]
    fn test_pdf_export() {
        let bytes = PdfExporter.export(&document()).unwrap();
        assert!(bytes.starts_with(b"%PDF"), "Output is not a PDF document");
    }

    #[test]
    fn test_pdf_export_paginates_long_reports() {
        assert_eq!(page_count(&PdfExporter.export(&document()).unwrap()), 1);

        let mut doc = document();
        doc.sections[0].items = (0..200).map(|i| format!("Symptom number {i}")).collect();
        let bytes = PdfExporter.export(&doc).unwrap();
        assert!(page_count(&bytes) > 1, "Long report fitted on a single page");
    }

    #[test]
    fn test_pdf_embeds_analyzed_image() {
        let bytes = PdfExporter.export(&document_with_picture()).unwrap();
        assert!(pdf_objects(&bytes).contains("/Subtype/Image"));
    }

    #[test]
    fn test_pdf_without_decodable_image_still_exports() {
        // L'en-tête PNG seul n'est pas décodable
        let bytes = PdfExporter.export(&document()).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert!(!pdf_objects(&bytes).contains("/Subtype/Image"));
    }

    #[test]
    fn test_wrap_text() {
        assert_eq!(wrap_text("", 10), vec![String::new()]);
        assert_eq!(wrap_text("one two three", 8), vec!["one two", "three"]);
    }
}
