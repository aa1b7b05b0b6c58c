/// Bucket prefix holding every image of one report:
/// `images/{user_id}/{report_id}/`
fn image_prefix(user_id: &str, report_id: &str) -> String {
    format!("images/{}/{}/", user_id, report_id)
}

/// Fresh storage path for an upload. Names never collide across parallel uploads.
pub fn image_path(user_id: &str, report_id: &str) -> String {
    format!(
        "{}{}_{}.jpg",
        image_prefix(user_id, report_id),
        chrono::Utc::now().timestamp_millis(),
        uuid::Uuid::new_v4().simple()
    )
}
