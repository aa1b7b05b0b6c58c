use std::io::Cursor;
use std::time::Duration;

use editor_block::{capture_channel, EditorError, EditorSession, SyncStatus};
use fieldnote_shared::memory::{InMemoryReportStore, StaticIdentity, TestBackend};
use fieldnote_shared::{AppContext, Point, Principal, Report, ToastLevel};
use image::{DynamicImage, ImageOutputFormat, RgbImage};
use pretty_assertions::assert_eq;

fn owner() -> Principal {
    Principal {
        user_id: "u1".to_string(),
        email: "inspector@example.com".to_string(),
    }
}

fn visitor() -> Principal {
    Principal {
        user_id: "u2".to_string(),
        email: "visitor@example.com".to_string(),
    }
}

fn report() -> Report {
    Report {
        report_id: "r1".to_string(),
        owner_id: "u1".to_string(),
        owner_email: "inspector@example.com".to_string(),
        title: "Warehouse visit".to_string(),
        area: String::new(),
        created_at: "2024-05-10T09:00:00+00:00".to_string(),
        points: vec![Point {
            point_id: "p1".to_string(),
            text: String::new(),
            images: Vec::new(),
        }],
    }
}

fn backend() -> TestBackend {
    TestBackend::new(
        InMemoryReportStore::with_reports(vec![report()]),
        StaticIdentity::new(owner(), "secret"),
    )
}

fn session_for(backend: &TestBackend, principal: Principal) -> EditorSession {
    EditorSession::open(AppContext::new(backend.services.clone(), principal), report())
}

fn jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, image::Rgb([30, 120, 200])));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageOutputFormat::Jpeg(90)).unwrap();
    buf.into_inner()
}

#[tokio::test(start_paused = true)]
async fn rapid_edits_produce_one_save_with_the_final_text() {
    let backend = backend();
    let mut session = session_for(&backend, owner());

    for text in ["C", "Cr", "Crack", "Crack in wall"] {
        session.edit_point_text("p1", text).await.unwrap();
        tokio::time::advance(Duration::from_millis(400)).await;
        assert_eq!(session.flush_if_due().await.unwrap(), false);
    }
    assert_eq!(session.status(), SyncStatus::Unsaved);
    assert!(backend.store.puts().is_empty());

    session.wait_for_deadline().await;
    assert_eq!(session.flush_if_due().await.unwrap(), true);

    let puts = backend.store.puts();
    assert_eq!(puts.len(), 1);
    assert_eq!(puts[0].points[0].text, "Crack in wall");
    assert_eq!(session.status(), SyncStatus::Saved);
}

#[tokio::test(start_paused = true)]
async fn structural_edit_cancels_the_pending_debounce() {
    let backend = backend();
    let mut session = session_for(&backend, owner());

    session.set_area("Loading bay").await.unwrap();
    assert!(session.deadline().is_some());

    let new_point = session.add_point().await.unwrap();
    assert_eq!(session.deadline(), None);
    assert_eq!(session.status(), SyncStatus::Saved);

    tokio::time::advance(Duration::from_secs(5)).await;
    assert_eq!(session.flush_if_due().await.unwrap(), false);

    let puts = backend.store.puts();
    assert_eq!(puts.len(), 1);
    assert_eq!(puts[0].area, "Loading bay");
    assert_eq!(puts[0].points.len(), 2);
    assert_eq!(puts[0].points[1].point_id, new_point);
}

#[tokio::test]
async fn visitors_cannot_change_anything() {
    let photo = "images/u1/r1/1715331600000_a.jpg";
    let mut seeded = report();
    seeded.points[0].images.push(photo.to_string());

    let backend = TestBackend::new(
        InMemoryReportStore::with_reports(vec![seeded.clone()]),
        StaticIdentity::new(owner(), "secret"),
    );
    backend.storage.insert(photo, jpeg(8, 8));
    let mut session = EditorSession::open(AppContext::new(backend.services.clone(), visitor()), seeded.clone());
    assert!(!session.is_editable());

    assert!(matches!(session.set_title("Hijacked").await, Err(EditorError::ReadOnly)));
    assert!(matches!(session.set_area("Elsewhere").await, Err(EditorError::ReadOnly)));
    assert!(matches!(session.edit_point_text("p1", "x").await, Err(EditorError::ReadOnly)));
    assert!(matches!(session.add_point().await, Err(EditorError::ReadOnly)));
    assert!(matches!(session.remove_point("p1").await, Err(EditorError::ReadOnly)));
    assert!(matches!(
        session.attach_images("p1", vec![jpeg(8, 8)]).await,
        Err(EditorError::ReadOnly)
    ));
    assert!(matches!(session.remove_image("p1", photo).await, Err(EditorError::ReadOnly)));

    let (dictation, responder) = capture_channel();
    responder.respond(Ok("overheard".to_string()));
    assert!(matches!(session.dictate_into("p1", dictation).await, Err(EditorError::ReadOnly)));

    let (camera, responder) = capture_channel();
    responder.respond(Ok(jpeg(8, 8)));
    assert!(matches!(session.capture_photo("p1", camera).await, Err(EditorError::ReadOnly)));

    assert_eq!(session.leave().await, SyncStatus::Saved);

    assert!(backend.store.puts().is_empty());
    assert!(backend.store.deletes().is_empty());
    assert_eq!(backend.storage.upload_calls(), 0);
    assert!(backend.storage.deletes().is_empty());
    assert!(backend.storage.contains(photo));
    assert_eq!(session.report(), &seeded);

    // Viewers may still export
    let file = session.export_docx().await.unwrap();
    assert_eq!(file.filename, "Report_Warehouse_visit.docx");
}

#[tokio::test]
async fn failed_save_stays_unsaved_and_tells_the_user() {
    let mut backend = backend();
    let mut session = session_for(&backend, owner());
    backend.store.set_fail_puts(true);

    session.add_point().await.unwrap();
    assert_eq!(session.status(), SyncStatus::Unsaved);
    assert_eq!(session.report().points.len(), 2);

    let toasts = backend.drain_toasts();
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].level, ToastLevel::Error);

    assert!(matches!(session.flush().await, Err(EditorError::Persist(_))));

    backend.store.set_fail_puts(false);
    assert_eq!(session.leave().await, SyncStatus::Saved);
    assert_eq!(backend.store.stored("r1").unwrap().points.len(), 2);
}

#[tokio::test(start_paused = true)]
async fn leaving_saves_pending_edits() {
    let backend = backend();
    let mut session = session_for(&backend, owner());

    session.set_title("Warehouse visit, day 2").await.unwrap();
    assert_eq!(session.leave().await, SyncStatus::Saved);

    let puts = backend.store.puts();
    assert_eq!(puts.len(), 1);
    assert_eq!(puts[0].title, "Warehouse visit, day 2");
}

#[tokio::test]
async fn text_and_photo_survive_a_reload() {
    let backend = backend();
    let mut session = session_for(&backend, owner());

    session.edit_point_text("p1", "X").await.unwrap();
    let paths = session.attach_images("p1", vec![jpeg(2400, 1200)]).await.unwrap();
    assert_eq!(paths.len(), 1);
    assert!(paths[0].starts_with("images/u1/r1/"));
    assert!(paths[0].ends_with(".jpg"));
    session.leave().await;

    let stored = backend.store.stored("r1").unwrap();
    assert_eq!(stored.points[0].text, "X");
    assert_eq!(stored.points[0].images, paths);
    assert!(backend.storage.contains(&paths[0]));
    assert_eq!(session.image_url(&paths[0]).await.unwrap(), format!("memory://{}", paths[0]));
}

#[tokio::test]
async fn batch_upload_is_all_or_nothing() {
    let mut backend = backend();
    let mut session = session_for(&backend, owner());
    backend.storage.set_fail_uploads(true);

    let result = session.attach_images("p1", vec![jpeg(16, 16), jpeg(16, 16)]).await;
    assert!(matches!(result, Err(EditorError::Upload(_))));
    assert!(session.report().points[0].images.is_empty());
    assert!(backend.store.puts().is_empty());
    assert_eq!(backend.drain_toasts().len(), 1);
}

#[tokio::test]
async fn undecodable_upload_is_rejected() {
    let backend = backend();
    let mut session = session_for(&backend, owner());

    let result = session.attach_images("p1", vec![b"definitely not an image".to_vec()]).await;
    assert!(matches!(result, Err(EditorError::Compression(_))));
    assert_eq!(backend.storage.upload_calls(), 0);
}

#[tokio::test]
async fn removing_an_image_ignores_blob_delete_failures() {
    let backend = backend();
    let mut session = session_for(&backend, owner());
    let paths = session.attach_images("p1", vec![jpeg(32, 32)]).await.unwrap();
    backend.storage.set_fail_deletes(true);

    session.remove_image("p1", &paths[0]).await.unwrap();

    assert!(session.report().points[0].images.is_empty());
    assert_eq!(backend.storage.deletes(), paths);
    assert!(backend.store.stored("r1").unwrap().points[0].images.is_empty());
    assert!(matches!(
        session.remove_image("p1", &paths[0]).await,
        Err(EditorError::UnknownImage(_))
    ));
}

#[tokio::test]
async fn removing_a_point_leaves_its_blobs() {
    let backend = backend();
    let mut session = session_for(&backend, owner());
    let paths = session.attach_images("p1", vec![jpeg(32, 32)]).await.unwrap();

    session.remove_point("p1").await.unwrap();
    assert!(session.report().points.is_empty());
    assert!(backend.storage.deletes().is_empty());
    assert!(backend.storage.contains(&paths[0]));
    assert!(matches!(session.remove_point("p1").await, Err(EditorError::UnknownPoint(_))));
}

#[tokio::test(start_paused = true)]
async fn dictation_appends_to_the_point() {
    let backend = backend();
    let mut session = session_for(&backend, owner());
    session.edit_point_text("p1", "Roof leaks").await.unwrap();

    let (dictation, responder) = capture_channel();
    tokio::spawn(async move {
        responder.respond(Ok(" near the skylight ".to_string()));
    });
    session.dictate_into("p1", dictation).await.unwrap();

    assert_eq!(session.report().points[0].text, "Roof leaks near the skylight");
    assert_eq!(session.status(), SyncStatus::Unsaved);
}

#[tokio::test]
async fn cancelled_capture_changes_nothing() {
    let backend = backend();
    let mut session = session_for(&backend, owner());

    let (photo, responder) = capture_channel::<Vec<u8>>();
    drop(responder);
    assert!(matches!(
        session.capture_photo("p1", photo).await,
        Err(EditorError::CaptureCancelled)
    ));
    assert!(session.report().points[0].images.is_empty());
    assert_eq!(backend.storage.upload_calls(), 0);
}

#[tokio::test]
async fn captured_photo_is_attached() {
    let backend = backend();
    let mut session = session_for(&backend, owner());

    let (photo, responder) = capture_channel();
    responder.respond(Ok(jpeg(64, 48)));
    let path = session.capture_photo("p1", photo).await.unwrap();

    assert_eq!(session.report().points[0].images, vec![path]);
    assert_eq!(session.status(), SyncStatus::Saved);
}
