use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use std::time::Duration;

use super::model::image_path;

/// How long a resolved image URL stays valid
pub const PRESIGNED_URL_TTL: Duration = Duration::from_secs(15 * 60);

/// Upload already-compressed JPEG bytes under the owner's namespace, returns the storage path
pub async fn upload_image(
    s3_client: &S3Client,
    bucket_name: &str,
    user_id: &str,
    report_id: &str,
    jpeg: Vec<u8>,
) -> Result<String, String> {
    let path = image_path(user_id, report_id);
    let size = jpeg.len();

    s3_client
        .put_object()
        .bucket(bucket_name)
        .key(&path)
        .content_type("image/jpeg")
        .body(ByteStream::from(jpeg))
        .send()
        .await
        .map_err(|e| format!("S3 put_object error: {}", e))?;

    tracing::info!("📤 Uploaded {} ({} bytes)", path, size);
    Ok(path)
}

/// Temporary GET URL for a stored image
pub async fn presign_image(s3_client: &S3Client, bucket_name: &str, path: &str) -> Result<String, String> {
    let config = PresigningConfig::expires_in(PRESIGNED_URL_TTL)
        .map_err(|e| format!("Invalid presigning config: {}", e))?;

    let request = s3_client
        .get_object()
        .bucket(bucket_name)
        .key(path)
        .presigned(config)
        .await
        .map_err(|e| format!("S3 presign error: {}", e))?;

    Ok(request.uri().to_string())
}

/// Download the raw bytes of a stored image
pub async fn fetch_image(s3_client: &S3Client, bucket_name: &str, path: &str) -> Result<Vec<u8>, String> {
    let object = s3_client
        .get_object()
        .bucket(bucket_name)
        .key(path)
        .send()
        .await
        .map_err(|e| format!("S3 get_object error: {}", e))?;

    let data = object
        .body
        .collect()
        .await
        .map_err(|e| format!("S3 body read error: {}", e))?;

    Ok(data.into_bytes().to_vec())
}

/// Delete one stored image
pub async fn delete_image(s3_client: &S3Client, bucket_name: &str, path: &str) -> Result<(), String> {
    s3_client
        .delete_object()
        .bucket(bucket_name)
        .key(path)
        .send()
        .await
        .map_err(|e| format!("S3 delete_object error: {}", e))?;

    tracing::info!("🗑️ Deleted {}", path);
    Ok(())
}
