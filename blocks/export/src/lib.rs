//! PDF and DOCX export of a report.
//!
//! Both renderers walk the same structure in document order: title, metadata,
//! then every point with its text and images. Images are pulled through the
//! storage gateway; an image that cannot be fetched or decoded never aborts an
//! export. The PDF side paginates itself (see [`layout`]); DOCX leaves
//! pagination to the word processor.

pub mod docx;
pub mod filename;
pub mod images;
pub mod layout;
pub mod pdf;

use fieldnote_shared::{BlobStorage, Report};

pub use docx::render_docx;
pub use filename::{export_filename, slug};
pub use pdf::render_pdf;

/// Smallest and largest image width, as a percentage of printable width
pub const MIN_IMAGE_WIDTH_PERCENT: u8 = 10;
pub const MAX_IMAGE_WIDTH_PERCENT: u8 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Pdf,
    Docx,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Docx => "docx",
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Docx => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportOptions {
    /// PDF only: image width relative to the printable width
    pub image_width_percent: u8,
}

impl ExportOptions {
    pub fn with_image_width_percent(percent: u8) -> Self {
        Self {
            image_width_percent: percent.clamp(MIN_IMAGE_WIDTH_PERCENT, MAX_IMAGE_WIDTH_PERCENT),
        }
    }
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            image_width_percent: 50,
        }
    }
}

/// A finished file, ready to hand to the user as a download
#[derive(Debug, Clone)]
pub struct ExportedFile {
    pub filename: String,
    pub format: ExportFormat,
    pub bytes: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("PDF rendering failed: {0}")]
    Pdf(String),
    #[error("DOCX rendering failed: {0}")]
    Docx(String),
    #[error("export worker failed: {0}")]
    Worker(String),
}

/// Render `report` in the requested format
pub async fn export_report(
    report: &Report,
    storage: &dyn BlobStorage,
    format: ExportFormat,
    options: ExportOptions,
) -> Result<ExportedFile, ExportError> {
    match format {
        ExportFormat::Pdf => render_pdf(report, storage, options).await,
        ExportFormat::Docx => render_docx(report, storage).await,
    }
}

/// Creation date for headers, `YYYY-MM-DD`; falls back to the raw value.
pub(crate) fn display_date(report: &Report) -> String {
    report
        .created_at_utc()
        .map(|at| at.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| report.created_at.clone())
}

pub(crate) fn display_title(report: &Report) -> &str {
    if report.title.trim().is_empty() {
        "Untitled report"
    } else {
        report.title.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_width_is_clamped() {
        assert_eq!(ExportOptions::with_image_width_percent(0).image_width_percent, 10);
        assert_eq!(ExportOptions::with_image_width_percent(75).image_width_percent, 75);
        assert_eq!(ExportOptions::with_image_width_percent(250).image_width_percent, 100);
    }
}
