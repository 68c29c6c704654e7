use crate::error::{Error, Result};
use printpdf::{
    BuiltinFont, IndirectFontRef, Line, Mm, PdfDocument, PdfLayerReference, Point,
};

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const MARGIN_MM: f32 = 25.4;
const LINE_HEIGHT_MM: f32 = 6.35; // 18pt
const HEADING_PT: f32 = 18.0;
const SUBHEADING_PT: f32 = 14.0;
const BODY_PT: f32 = 12.0;
const PT_TO_MM: f32 = 0.352_778;

/// Renders the generated question text into an A4 paper with a fixed
/// letterhead: centered bold organization name, a subject/level subheading
/// and a horizontal rule, then the reply line by line.
#[derive(Clone, Default)]
pub struct PdfService;

impl PdfService {
    pub fn new() -> Self {
        Self
    }

    pub fn render_paper(
        &self,
        organization: &str,
        subject: &str,
        level: &str,
        body: &str,
    ) -> Result<Vec<u8>> {
        let (doc, page, layer) = PdfDocument::new(
            format!("{} Question Paper", subject),
            Mm(PAGE_WIDTH_MM),
            Mm(PAGE_HEIGHT_MM),
            "Layer 1",
        );
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| Error::Render(e.to_string()))?;
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| Error::Render(e.to_string()))?;

        let current = doc.get_page(page).get_layer(layer);
        let heading_y = PAGE_HEIGHT_MM - MARGIN_MM;
        draw_centered(&current, organization, HEADING_PT, Mm(heading_y), &bold);
        let subheading = format!("Subject: {} | Level: {}", subject, level);
        draw_centered(
            &current,
            &subheading,
            SUBHEADING_PT,
            Mm(heading_y - 7.0),
            &regular,
        );

        current.set_outline_thickness(1.0);
        current.add_line(Line {
            points: vec![
                (Point::new(Mm(MARGIN_MM), Mm(heading_y - 10.6)), false),
                (
                    Point::new(Mm(PAGE_WIDTH_MM - MARGIN_MM), Mm(heading_y - 10.6)),
                    false,
                ),
            ],
            is_closed: false,
        });

        let mut body_layer = current;
        let mut y = PAGE_HEIGHT_MM - 1.5 * MARGIN_MM;
        for line in body.split('\n') {
            if y < MARGIN_MM {
                let (next_page, next_layer) =
                    doc.add_page(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), "Layer 1");
                body_layer = doc.get_page(next_page).get_layer(next_layer);
                y = PAGE_HEIGHT_MM - MARGIN_MM;
            }
            body_layer.use_text(line, BODY_PT, Mm(MARGIN_MM), Mm(y), &regular);
            y -= LINE_HEIGHT_MM;
        }

        doc.save_to_bytes().map_err(|e| Error::Render(e.to_string()))
    }
}

// The builtin fonts expose no metrics, so centering uses an average advance
// of half an em per character, clamped to the left margin.
fn draw_centered(
    layer: &PdfLayerReference,
    text: &str,
    size_pt: f32,
    y: Mm,
    font: &IndirectFontRef,
) {
    let width_mm = text.chars().count() as f32 * size_pt * 0.5 * PT_TO_MM;
    let x = ((PAGE_WIDTH_MM - width_mm) / 2.0).max(MARGIN_MM);
    layer.use_text(text, size_pt, Mm(x), y, font);
}
