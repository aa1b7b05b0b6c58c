use std::time::Duration;

use futures::future::try_join_all;
use tokio::time::Instant;

use crate::capture::{CaptureError, Dictation, PhotoCapture};
use crate::error::EditorError;
use crate::sync::{SyncAction, SyncController, SyncStatus, DEFAULT_DEBOUNCE};
use export_block::{export_report, ExportFormat, ExportOptions, ExportedFile};
use fieldnote_atoms::media::{compress_image, CompressionError};
use fieldnote_atoms::reports::{Point, Report};
use fieldnote_shared::AppContext;

/// One open report. Owns the working copy and its autosave state.
///
/// Text edits (title, area, point text) are debounced; structural edits
/// (points, images) save at once and cancel any pending debounce. Every
/// save sends the whole report. Viewers who are not the owner get a
/// read-only session: every mutation returns [`EditorError::ReadOnly`] before
/// touching the backend.
pub struct EditorSession {
    ctx: AppContext,
    report: Report,
    editable: bool,
    sync: SyncController,
}

impl EditorSession {
    pub fn open(ctx: AppContext, report: Report) -> Self {
        Self::with_debounce(ctx, report, DEFAULT_DEBOUNCE)
    }

    pub fn with_debounce(ctx: AppContext, report: Report, delay: Duration) -> Self {
        let editable = report.is_owned_by(&ctx.principal);
        tracing::info!(
            "📂 Opened report {} ({})",
            report.report_id,
            if editable { "editable" } else { "read-only" }
        );
        Self {
            ctx,
            report,
            editable,
            sync: SyncController::new(delay),
        }
    }

    pub fn report(&self) -> &Report {
        &self.report
    }

    pub fn into_report(self) -> Report {
        self.report
    }

    pub fn is_editable(&self) -> bool {
        self.editable
    }

    pub fn status(&self) -> SyncStatus {
        self.sync.status()
    }

    /// When the pending debounced save fires, if one is scheduled
    pub fn deadline(&self) -> Option<Instant> {
        self.sync.deadline()
    }

    fn ensure_editable(&self) -> Result<(), EditorError> {
        if self.editable {
            Ok(())
        } else {
            Err(EditorError::ReadOnly)
        }
    }

    fn point_mut(&mut self, point_id: &str) -> Result<&mut Point, EditorError> {
        self.report
            .point_mut(point_id)
            .ok_or_else(|| EditorError::UnknownPoint(point_id.to_string()))
    }

    /// Record the edit and save now if it asks for it. A failed save has
    /// already been surfaced as a toast and leaves the session unsaved.
    async fn after_edit(&mut self, immediate: bool) {
        if self.sync.record_edit(Instant::now(), immediate) == SyncAction::FlushNow {
            let _ = self.flush().await;
        }
    }

    pub async fn set_title(&mut self, title: impl Into<String>) -> Result<(), EditorError> {
        self.ensure_editable()?;
        self.report.title = title.into();
        self.after_edit(false).await;
        Ok(())
    }

    pub async fn set_area(&mut self, area: impl Into<String>) -> Result<(), EditorError> {
        self.ensure_editable()?;
        self.report.area = area.into();
        self.after_edit(false).await;
        Ok(())
    }

    pub async fn edit_point_text(&mut self, point_id: &str, text: impl Into<String>) -> Result<(), EditorError> {
        self.ensure_editable()?;
        self.point_mut(point_id)?.text = text.into();
        self.after_edit(false).await;
        Ok(())
    }

    /// Append an empty point and return its id
    pub async fn add_point(&mut self) -> Result<String, EditorError> {
        self.ensure_editable()?;
        let point = Point::new();
        let point_id = point.point_id.clone();
        self.report.points.push(point);
        self.after_edit(true).await;
        Ok(point_id)
    }

    /// Image blobs of the removed point stay in storage
    pub async fn remove_point(&mut self, point_id: &str) -> Result<(), EditorError> {
        self.ensure_editable()?;
        let before = self.report.points.len();
        self.report.points.retain(|p| p.point_id != point_id);
        if self.report.points.len() == before {
            return Err(EditorError::UnknownPoint(point_id.to_string()));
        }
        self.after_edit(true).await;
        Ok(())
    }

    /// Compress and upload every file, then attach all paths in one update.
    /// If any file fails nothing is attached.
    pub async fn attach_images(&mut self, point_id: &str, files: Vec<Vec<u8>>) -> Result<Vec<String>, EditorError> {
        self.ensure_editable()?;
        if self.report.point(point_id).is_none() {
            return Err(EditorError::UnknownPoint(point_id.to_string()));
        }
        if files.is_empty() {
            return Ok(Vec::new());
        }

        let count = files.len();
        let storage = self.ctx.storage().clone();
        let user_id = self.ctx.principal.user_id.clone();
        let report_id = self.report.report_id.clone();
        let uploads = files.into_iter().map(|bytes| {
            let storage = storage.clone();
            let user_id = user_id.clone();
            let report_id = report_id.clone();
            async move {
                let compressed = tokio::task::spawn_blocking(move || compress_image(&bytes))
                    .await
                    .map_err(|e| CompressionError::Worker(e.to_string()))??;
                let path = storage
                    .upload(compressed.bytes, &user_id, &report_id)
                    .await
                    .map_err(EditorError::Upload)?;
                Ok::<String, EditorError>(path)
            }
        });

        let paths = match try_join_all(uploads).await {
            Ok(paths) => paths,
            Err(e) => {
                tracing::error!("❌ Attaching {} image(s) to {} failed: {}", count, point_id, e);
                self.ctx.notifier().error(format!("Could not add photos: {}", e));
                return Err(e);
            }
        };

        tracing::info!("🖼️ Attached {} image(s) to point {}", paths.len(), point_id);
        self.point_mut(point_id)?.images.extend(paths.iter().cloned());
        self.after_edit(true).await;
        Ok(paths)
    }

    /// Detach locally and save, then try to delete the blob. A failed blob
    /// delete is logged and otherwise ignored.
    pub async fn remove_image(&mut self, point_id: &str, path: &str) -> Result<(), EditorError> {
        self.ensure_editable()?;
        let point = self.point_mut(point_id)?;
        let index = point
            .images
            .iter()
            .position(|p| p == path)
            .ok_or_else(|| EditorError::UnknownImage(path.to_string()))?;
        point.images.remove(index);
        self.after_edit(true).await;

        if let Err(e) = self.ctx.storage().delete(path).await {
            tracing::warn!("Image {} left in storage: {}", path, e);
        }
        Ok(())
    }

    /// Temporary URL for showing an attached image
    pub async fn image_url(&self, path: &str) -> Result<String, EditorError> {
        self.ctx.storage().resolve(path).await.map_err(EditorError::Storage)
    }

    /// Append a dictated transcript to the point text
    pub async fn dictate_into(&mut self, point_id: &str, dictation: Dictation) -> Result<(), EditorError> {
        self.ensure_editable()?;
        self.point_mut(point_id)?;
        let transcript = dictation.outcome().await.map_err(capture_error)?;
        let transcript = transcript.trim();
        if transcript.is_empty() {
            return Ok(());
        }

        let point = self.point_mut(point_id)?;
        if point.text.is_empty() {
            point.text = transcript.to_string();
        } else {
            point.text = format!("{} {}", point.text.trim_end(), transcript);
        }
        self.after_edit(false).await;
        Ok(())
    }

    /// Attach one photo from the camera
    pub async fn capture_photo(&mut self, point_id: &str, photo: PhotoCapture) -> Result<String, EditorError> {
        self.ensure_editable()?;
        self.point_mut(point_id)?;
        let bytes = photo.outcome().await.map_err(capture_error)?;
        let mut paths = self.attach_images(point_id, vec![bytes]).await?;
        paths.pop().ok_or_else(|| EditorError::Capture("no image produced".to_string()))
    }

    /// Save now if anything is unsaved. On failure the user gets a toast and
    /// the session stays unsaved.
    pub async fn flush(&mut self) -> Result<(), EditorError> {
        loop {
            let Some(ticket) = self.sync.begin_flush() else {
                return Ok(());
            };
            let snapshot = self.report.clone();
            let result = self.ctx.store().put(&snapshot).await;
            let next = self.sync.finish_flush(ticket, result.is_ok(), Instant::now());

            if let Err(e) = result {
                tracing::error!("❌ Saving report {} failed: {}", snapshot.report_id, e);
                self.ctx.notifier().error(format!("Changes could not be saved: {}", e));
                return Err(EditorError::Persist(e));
            }
            tracing::debug!("💾 Saved report {}", snapshot.report_id);

            if next == SyncAction::Wait {
                return Ok(());
            }
        }
    }

    /// Run the debounced save if its deadline has passed. `true` if a save ran.
    pub async fn flush_if_due(&mut self) -> Result<bool, EditorError> {
        if !self.sync.is_due(Instant::now()) {
            return Ok(false);
        }
        self.flush().await?;
        Ok(true)
    }

    /// Sleep until the pending debounced save is due. Never resolves when
    /// nothing is scheduled, so it can sit in a `select!` next to input.
    pub async fn wait_for_deadline(&self) {
        match self.sync.deadline() {
            Some(deadline) => tokio::time::sleep_until(deadline).await,
            None => std::future::pending::<()>().await,
        }
    }

    /// Navigating away: save whatever is still unsaved
    pub async fn leave(&mut self) -> SyncStatus {
        if self.sync.status() != SyncStatus::Saved {
            let _ = self.flush().await;
        }
        self.sync.status()
    }

    /// Export is open to viewers too
    pub async fn export(&self, format: ExportFormat, options: ExportOptions) -> Result<ExportedFile, EditorError> {
        match export_report(&self.report, self.ctx.storage().as_ref(), format, options).await {
            Ok(file) => Ok(file),
            Err(e) => {
                tracing::error!("❌ Export of {} failed: {}", self.report.report_id, e);
                self.ctx.notifier().error(format!("Export failed: {}", e));
                Err(e.into())
            }
        }
    }

    pub async fn export_pdf(&self, options: ExportOptions) -> Result<ExportedFile, EditorError> {
        self.export(ExportFormat::Pdf, options).await
    }

    pub async fn export_docx(&self) -> Result<ExportedFile, EditorError> {
        self.export(ExportFormat::Docx, ExportOptions::default()).await
    }
}

fn capture_error(e: CaptureError) -> EditorError {
    match e {
        CaptureError::Cancelled => EditorError::CaptureCancelled,
        CaptureError::Failed(message) => EditorError::Capture(message),
    }
}
