use image::DynamicImage;
use printpdf::{BuiltinFont, Image, ImageTransform, IndirectFontRef, Mm, PdfDocument};

use crate::images::{dimensions, load_report_images, ReportImages};
use crate::layout::{layout_blocks, report_blocks, PageGeometry, PageLayout, Placed, TextStyle};
use crate::{display_date, display_title, export_filename, ExportError, ExportFormat, ExportOptions, ExportedFile};
use fieldnote_shared::{BlobStorage, Report};

/// Resolution printpdf assumes when sizing embedded images
const IMAGE_DPI: f32 = 300.0;

/// Header lines under the title
pub fn meta_lines(report: &Report) -> Vec<String> {
    let mut lines = Vec::new();
    if !report.area.trim().is_empty() {
        lines.push(format!("Area: {}", report.area));
    }
    lines.push(format!("Author: {}", report.owner_email));
    lines.push(format!("Created: {}", display_date(report)));
    lines
}

/// Pages the PDF export would produce for these image sizes
pub fn paginate(report: &Report, dims: &[Vec<Option<(u32, u32)>>], options: ExportOptions) -> Vec<PageLayout> {
    let blocks = report_blocks(report, display_title(report), &meta_lines(report), dims);
    layout_blocks(&blocks, &PageGeometry::A4, options.image_width_percent)
}

pub async fn render_pdf(
    report: &Report,
    storage: &dyn BlobStorage,
    options: ExportOptions,
) -> Result<ExportedFile, ExportError> {
    let images = load_report_images(storage, report).await;
    let pages = paginate(report, &dimensions(&images), options);
    let title = display_title(report).to_string();
    let page_count = pages.len();

    let bytes = tokio::task::spawn_blocking(move || draw(&title, &pages, &images, &PageGeometry::A4))
        .await
        .map_err(|e| ExportError::Worker(e.to_string()))??;

    let filename = export_filename(&report.title, ExportFormat::Pdf);
    tracing::info!("📄 Exported {} ({} pages, {} bytes)", filename, page_count, bytes.len());

    Ok(ExportedFile {
        filename,
        format: ExportFormat::Pdf,
        bytes,
    })
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    italic: IndirectFontRef,
}

impl Fonts {
    fn for_style(&self, style: TextStyle) -> &IndirectFontRef {
        match style {
            TextStyle::Title | TextStyle::Heading => &self.bold,
            TextStyle::Placeholder => &self.italic,
            TextStyle::Meta | TextStyle::Body => &self.regular,
        }
    }
}

fn draw(title: &str, pages: &[PageLayout], images: &ReportImages, geometry: &PageGeometry) -> Result<Vec<u8>, ExportError> {
    let pdf_err = |e: printpdf::Error| ExportError::Pdf(e.to_string());

    let (doc, first_page, first_layer) =
        PdfDocument::new(title, Mm(geometry.width_mm), Mm(geometry.height_mm), "Layer 1");
    let fonts = Fonts {
        regular: doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_err)?,
        bold: doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(pdf_err)?,
        italic: doc.add_builtin_font(BuiltinFont::HelveticaOblique).map_err(pdf_err)?,
    };

    for (number, page) in pages.iter().enumerate() {
        let layer = if number == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page_index, layer_index) =
                doc.add_page(Mm(geometry.width_mm), Mm(geometry.height_mm), "Layer 1");
            doc.get_page(page_index).get_layer(layer_index)
        };

        for item in &page.items {
            match item {
                Placed::Line {
                    style,
                    text,
                    x_mm,
                    top_mm,
                } => {
                    let baseline = geometry.height_mm - top_mm - style.baseline_offset_mm();
                    layer.use_text(
                        text.as_str(),
                        style.font_size_pt(),
                        Mm(*x_mm),
                        Mm(baseline),
                        fonts.for_style(*style),
                    );
                }
                Placed::Image {
                    image,
                    x_mm,
                    top_mm,
                    width_mm,
                    height_mm,
                } => {
                    let Some(decoded) = images.get(image.point).and_then(|p| p.get(image.index)).and_then(Option::as_ref)
                    else {
                        continue;
                    };
                    embed(decoded, &layer, *x_mm, geometry.height_mm - top_mm - height_mm, *width_mm, *height_mm);
                }
            }
        }
    }

    doc.save_to_bytes().map_err(pdf_err)
}

/// Place `img` with its lower-left corner at (`x_mm`, `bottom_mm`), scaled to the given box
fn embed(img: &DynamicImage, layer: &printpdf::PdfLayerReference, x_mm: f32, bottom_mm: f32, width_mm: f32, height_mm: f32) {
    let natural_width_mm = img.width() as f32 * 25.4 / IMAGE_DPI;
    let natural_height_mm = img.height() as f32 * 25.4 / IMAGE_DPI;

    Image::from_dynamic_image(img).add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(Mm(x_mm)),
            translate_y: Some(Mm(bottom_mm)),
            scale_x: Some(width_mm / natural_width_mm),
            scale_y: Some(height_mm / natural_height_mm),
            dpi: Some(IMAGE_DPI),
            ..Default::default()
        },
    );
}
