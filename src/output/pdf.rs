//! PDF export
//!
//! Produces a cover page with totals per category followed by one section
//! per non-empty category. Each product lists its fields and a clickable
//! link to its public image.

use crate::output::traits::{Exporter, HarvestReport, OutputError, OutputResult};
use crate::record::{ProductRecord, COLUMN_HEADERS};
use crate::state::RunContext;
use printpdf::{
    Actions, BuiltinFont, Color, IndirectFontRef, LinkAnnotation, Mm, PdfDocument,
    PdfDocumentReference, PdfLayerReference, Rect, Rgb,
};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

pub const TITLE: &str = "Relatório de Produtos Leveros";
pub const IMAGE_LINK_TEXT: &str = "LINK PARA FOTO DO PRODUTO (Clique para visualizar)";

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 15.0;
const LAYER: &str = "Conteúdo";

/// Millimetres per typographic point
const MM_PER_PT: f32 = 0.3528;
/// Average Helvetica glyph width as a fraction of the font size
const AVG_GLYPH_WIDTH: f32 = 0.5;

/// Writes `ProdutosLeveros_<timestamp>.pdf`
pub struct PdfExporter;

impl PdfExporter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PdfExporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Exporter for PdfExporter {
    fn name(&self) -> &'static str {
        "pdf"
    }

    fn target_path(&self, context: &RunContext) -> PathBuf {
        context.document_path()
    }

    fn export(&self, report: &HarvestReport) -> OutputResult<PathBuf> {
        let path = self.target_path(&report.context);
        let mut writer = DocumentWriter::new(TITLE)?;

        writer.text(TITLE, Style::Title);
        writer.gap(5.0);
        writer.text(
            &format!(
                "Data de geração: {}",
                report.context.started_at.format("%d/%m/%Y %H:%M")
            ),
            Style::Body,
        );
        writer.text(
            &format!("Total de produtos: {}", report.total_records()),
            Style::Body,
        );
        writer.gap(10.0);

        writer.text("Resumo por Categoria", Style::Heading);
        writer.gap(5.0);
        for (category, count) in report.category_counts() {
            writer.text(&format!("{}: {} produtos", category, count), Style::Body);
        }

        for category in report.non_empty_categories() {
            writer.new_page();
            writer.text(&format!("Categoria: {}", category), Style::Heading);
            writer.gap(5.0);

            for (index, record) in report.records_for(category).enumerate() {
                write_record(&mut writer, index + 1, record);
            }
        }

        let file = File::create(&path)?;
        writer
            .doc
            .save(&mut BufWriter::new(file))
            .map_err(|e| OutputError::Pdf(e.to_string()))?;

        tracing::info!("PDF saved to {}", path.display());
        Ok(path)
    }
}

fn write_record(writer: &mut DocumentWriter, number: usize, record: &ProductRecord) {
    writer.text(&format!("Produto {}: {}", number, record.name), Style::Subheading);
    writer.text(&format!("Categoria: {}", record.category), Style::Small);

    if record.has_public_image() {
        writer.text("Segue link da foto do produto:", Style::Small);
        writer.link(IMAGE_LINK_TEXT, &record.public_image_url);
    } else {
        writer.text("Foto do produto: Não disponível", Style::Small);
    }

    // Remaining fields, skipping category, name and both image columns
    let values = record.values();
    for column in 2..7 {
        writer.text(
            &format!("{}: {}", COLUMN_HEADERS[column], values[column]),
            Style::Small,
        );
    }

    writer.gap(8.0);
}

#[derive(Debug, Clone, Copy)]
enum Style {
    Title,
    Heading,
    Subheading,
    Body,
    Small,
}

impl Style {
    fn size(&self) -> f32 {
        match self {
            Self::Title => 16.0,
            Self::Heading => 14.0,
            Self::Subheading => 12.0,
            Self::Body => 12.0,
            Self::Small => 10.0,
        }
    }

    fn line_height(&self) -> f32 {
        match self {
            Self::Title | Self::Heading => 10.0,
            _ => 8.0,
        }
    }

    fn bold(&self) -> bool {
        matches!(self, Self::Title | Self::Heading | Self::Subheading)
    }
}

/// Top-down text cursor over an A4 document
struct DocumentWriter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    y: f32,
}

impl DocumentWriter {
    fn new(title: &str) -> OutputResult<Self> {
        let (doc, page, layer) = PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), LAYER);
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| OutputError::Pdf(e.to_string()))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| OutputError::Pdf(e.to_string()))?;
        let layer = doc.get_page(page).get_layer(layer);

        Ok(Self {
            doc,
            layer,
            regular,
            bold,
            y: PAGE_HEIGHT - MARGIN,
        })
    }

    fn new_page(&mut self) {
        let (page, layer) = self.doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), LAYER);
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = PAGE_HEIGHT - MARGIN;
    }

    fn gap(&mut self, height: f32) {
        self.y -= height;
    }

    fn ensure_space(&mut self, height: f32) {
        if self.y - height < MARGIN {
            self.new_page();
        }
    }

    /// Writes text, wrapping it to the page width
    fn text(&mut self, text: &str, style: Style) {
        let font = if style.bold() {
            self.bold.clone()
        } else {
            self.regular.clone()
        };

        for line in wrap(text, chars_per_line(style.size())) {
            self.ensure_space(style.line_height());
            self.y -= style.line_height();
            self.layer
                .use_text(line, style.size(), Mm(MARGIN), Mm(self.y), &font);
        }
    }

    /// Writes blue link text with a URI annotation over it
    fn link(&mut self, text: &str, uri: &str) {
        let style = Style::Small;
        self.ensure_space(style.line_height());
        self.y -= style.line_height();

        let width = text_width(text, style.size());
        self.layer
            .set_fill_color(Color::Rgb(Rgb::new(0.0, 0.0, 1.0, None)));
        self.layer
            .use_text(text, style.size(), Mm(MARGIN), Mm(self.y), &self.bold);
        self.layer
            .set_fill_color(Color::Rgb(Rgb::new(0.0, 0.0, 0.0, None)));

        let rect = Rect::new(
            Mm(MARGIN),
            Mm(self.y - 1.0),
            Mm(MARGIN + width),
            Mm(self.y + style.size() * MM_PER_PT),
        );
        self.layer.add_link_annotation(LinkAnnotation::new(
            rect,
            None,
            None,
            Actions::uri(uri.to_string()),
            None,
        ));
    }
}

/// Approximate rendered width of a line, in millimetres
fn text_width(text: &str, size: f32) -> f32 {
    text.chars().count() as f32 * size * AVG_GLYPH_WIDTH * MM_PER_PT
}

fn chars_per_line(size: f32) -> usize {
    let usable = PAGE_WIDTH - 2.0 * MARGIN;
    (usable / (size * AVG_GLYPH_WIDTH * MM_PER_PT)) as usize
}

/// Greedy word wrap; words longer than a line are split
fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();

        while word.len() > width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let rest = word.split_off(width);
            lines.push(word.into_iter().collect());
            word = rest;
        }

        let needed = if current.is_empty() {
            word.len()
        } else {
            current.chars().count() + 1 + word.len()
        };
        if needed > width && !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.extend(word);
    }

    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}
