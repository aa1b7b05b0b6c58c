use futures::future::join_all;
use image::DynamicImage;

use fieldnote_shared::{BlobStorage, Report};

/// Decoded images, indexed `[point][image]` in document order.
/// `None` marks an image that could not be fetched or decoded.
pub type ReportImages = Vec<Vec<Option<DynamicImage>>>;

/// Fetch and decode every image of the report concurrently.
pub async fn load_report_images(storage: &dyn BlobStorage, report: &Report) -> ReportImages {
    let per_point = report.points.iter().map(|point| async move {
        join_all(point.images.iter().map(|path| load_one(storage, path))).await
    });
    join_all(per_point).await
}

async fn load_one(storage: &dyn BlobStorage, path: &str) -> Option<DynamicImage> {
    let bytes = match storage.fetch(path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!("Skipping image {} in export: {}", path, e);
            return None;
        }
    };

    let decoded = tokio::task::spawn_blocking(move || image::load_from_memory(&bytes)).await;
    match decoded {
        // Exports carry no transparency
        Ok(Ok(img)) => Some(DynamicImage::ImageRgb8(img.to_rgb8())),
        Ok(Err(e)) => {
            tracing::warn!("Skipping undecodable image {}: {}", path, e);
            None
        }
        Err(e) => {
            tracing::warn!("Decode worker failed for {}: {}", path, e);
            None
        }
    }
}

/// Pixel sizes of [`ReportImages`], same shape
pub fn dimensions(images: &ReportImages) -> Vec<Vec<Option<(u32, u32)>>> {
    images
        .iter()
        .map(|point| {
            point
                .iter()
                .map(|img| img.as_ref().map(|i| (i.width(), i.height())))
                .collect()
        })
        .collect()
}
