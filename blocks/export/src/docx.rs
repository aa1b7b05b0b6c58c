use std::io::Cursor;

use docx_rs::{Docx, Paragraph, Pic, Run};
use image::{DynamicImage, ImageOutputFormat};

use crate::images::load_report_images;
use crate::pdf::meta_lines;
use crate::{display_title, export_filename, ExportError, ExportFormat, ExportedFile};
use fieldnote_shared::{BlobStorage, Report};

/// Widest an image may be in the document, in pixels
pub const MAX_IMAGE_WIDTH_PX: u32 = 480;
const EMU_PER_PX: u32 = 9525;

// Run sizes are in half-points
const TITLE_SIZE: usize = 36;
const HEADING_SIZE: usize = 26;
const META_SIZE: usize = 20;

/// Display size for the document: capped width, aspect kept, never enlarged
pub fn fit_width(width_px: u32, height_px: u32, max_width: u32) -> (u32, u32) {
    if width_px <= max_width || width_px == 0 {
        return (width_px, height_px);
    }
    let height = (height_px as f64 * max_width as f64 / width_px as f64).round() as u32;
    (max_width, height.max(1))
}

pub async fn render_docx(report: &Report, storage: &dyn BlobStorage) -> Result<ExportedFile, ExportError> {
    let images = load_report_images(storage, report).await;
    let filename = export_filename(&report.title, ExportFormat::Docx);
    let owned = report.clone();

    let bytes = tokio::task::spawn_blocking(move || build(&owned, images))
        .await
        .map_err(|e| ExportError::Worker(e.to_string()))??;

    tracing::info!("📝 Exported {} ({} bytes)", filename, bytes.len());
    Ok(ExportedFile {
        filename,
        format: ExportFormat::Docx,
        bytes,
    })
}

fn build(report: &Report, images: Vec<Vec<Option<DynamicImage>>>) -> Result<Vec<u8>, ExportError> {
    let mut docx = Docx::new().add_paragraph(
        Paragraph::new().add_run(Run::new().add_text(display_title(report)).bold().size(TITLE_SIZE)),
    );
    for line in meta_lines(report) {
        docx = docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(line).size(META_SIZE)));
    }

    for ((number, point), point_images) in report.points.iter().enumerate().zip(images) {
        docx = docx.add_paragraph(
            Paragraph::new().add_run(Run::new().add_text(format!("Point {}", number + 1)).bold().size(HEADING_SIZE)),
        );
        let text = if point.text.trim().is_empty() { "(no text)" } else { point.text.as_str() };
        for line in text.split('\n') {
            docx = docx.add_paragraph(Paragraph::new().add_run(Run::new().add_text(line)));
        }

        // Images that failed to load are left out
        for img in point_images.into_iter().flatten() {
            match picture(&img) {
                Ok(pic) => docx = docx.add_paragraph(Paragraph::new().add_run(Run::new().add_image(pic))),
                Err(e) => tracing::warn!("Leaving image out of DOCX: {}", e),
            }
        }
    }

    let mut out = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut out)
        .map_err(|e| ExportError::Docx(e.to_string()))?;
    Ok(out.into_inner())
}

fn picture(img: &DynamicImage) -> Result<Pic, image::ImageError> {
    let mut png = Cursor::new(Vec::new());
    img.write_to(&mut png, ImageOutputFormat::Png)?;
    let (width, height) = fit_width(img.width(), img.height(), MAX_IMAGE_WIDTH_PX);
    Ok(Pic::new_with_dimensions(png.into_inner(), img.width(), img.height())
        .size(width * EMU_PER_PX, height * EMU_PER_PX))
}
