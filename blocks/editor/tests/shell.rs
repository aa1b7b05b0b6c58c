use editor_block::{Screen, Shell, ShellError, SyncStatus};
use fieldnote_shared::memory::{InMemoryReportStore, StaticIdentity, TestBackend};
use fieldnote_shared::{AppConfig, Principal, Report, ToastLevel};
use pretty_assertions::assert_eq;

fn owner() -> Principal {
    Principal {
        user_id: "u1".to_string(),
        email: "inspector@example.com".to_string(),
    }
}

fn report(id: &str, owner_id: &str, created_at: &str) -> Report {
    Report {
        report_id: id.to_string(),
        owner_id: owner_id.to_string(),
        owner_email: format!("{}@example.com", owner_id),
        title: format!("Report {}", id),
        area: String::new(),
        created_at: created_at.to_string(),
        points: Vec::new(),
    }
}

fn backend() -> TestBackend {
    TestBackend::new(
        InMemoryReportStore::with_reports(vec![
            report("old", "u1", "2024-01-01T08:00:00+00:00"),
            report("theirs", "u2", "2024-03-01T08:00:00+00:00"),
            report("new", "u1", "2024-06-01T08:00:00+00:00"),
        ]),
        StaticIdentity::new(owner(), "secret"),
    )
}

async fn signed_in(backend: &TestBackend) -> Shell {
    let mut shell = Shell::new(backend.services.clone());
    shell.sign_in("inspector@example.com", "secret").await.unwrap();
    shell
}

fn ids(shell: &Shell) -> Vec<&str> {
    shell.reports().iter().map(|r| r.report_id.as_str()).collect()
}

#[tokio::test]
async fn missing_configuration_blocks_everything() {
    let error = AppConfig::from_lookup(|_| None).unwrap_err();
    let mut shell = Shell::start(Err(error));

    match shell.screen() {
        Screen::NotConfigured { missing } => assert!(missing.contains(&"FIELDNOTE_TABLE_NAME")),
        other => panic!("unexpected screen {:?}", other),
    }
    assert!(matches!(
        shell.sign_in("inspector@example.com", "secret").await,
        Err(ShellError::NotConfigured(_))
    ));
}

#[tokio::test]
async fn wrong_password_stays_on_sign_in_with_message() {
    let backend = backend();
    let mut shell = Shell::start(Ok(backend.services.clone()));
    assert_eq!(shell.screen(), &Screen::SignIn { error: None });

    let result = shell.sign_in("inspector@example.com", "nope").await;
    assert!(matches!(result, Err(ShellError::Auth(_))));
    assert_eq!(
        shell.screen(),
        &Screen::SignIn {
            error: Some("Incorrect email or password".to_string())
        }
    );
    assert_eq!(backend.store.list_calls(), 0);
}

#[tokio::test]
async fn sign_in_lists_every_report_newest_first() {
    let backend = backend();
    let shell = signed_in(&backend).await;

    assert_eq!(shell.screen(), &Screen::ReportList);
    assert_eq!(ids(&shell), vec!["new", "theirs", "old"]);
    assert_eq!(shell.principal(), Some(&owner()));
}

#[tokio::test]
async fn delete_is_one_call_and_optimistic() {
    let backend = backend();
    let mut shell = signed_in(&backend).await;

    shell.delete_report("old").await.unwrap();
    assert_eq!(backend.store.deletes(), vec!["old".to_string()]);
    assert_eq!(ids(&shell), vec!["new", "theirs"]);
    assert!(backend.store.stored("old").is_none());
}

#[tokio::test]
async fn failed_delete_puts_the_report_back() {
    let mut backend = backend();
    let mut shell = signed_in(&backend).await;
    backend.store.set_fail_deletes(true);

    let result = shell.delete_report("new").await;
    assert!(matches!(result, Err(ShellError::Gateway(_))));
    assert_eq!(ids(&shell), vec!["new", "theirs", "old"]);

    let toasts = backend.drain_toasts();
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].level, ToastLevel::Error);
}

#[tokio::test]
async fn only_owners_may_delete() {
    let backend = backend();
    let mut shell = signed_in(&backend).await;

    assert!(matches!(shell.delete_report("theirs").await, Err(ShellError::NotOwner)));
    assert!(backend.store.deletes().is_empty());
    assert_eq!(ids(&shell).len(), 3);
}

#[tokio::test]
async fn others_reports_open_read_only() {
    let backend = backend();
    let mut shell = signed_in(&backend).await;

    let session = shell.open_report("theirs").unwrap();
    assert!(!session.is_editable());
    assert_eq!(
        shell.screen(),
        &Screen::Editor {
            report_id: "theirs".to_string(),
            read_only: true
        }
    );
    assert!(matches!(shell.open_report("ghost"), Err(ShellError::UnknownReport(_))));
}

#[tokio::test(start_paused = true)]
async fn new_report_is_persisted_and_edits_come_back_to_the_list() {
    let backend = backend();
    let mut shell = signed_in(&backend).await;

    let mut session = shell.create_report().await.unwrap();
    assert!(session.is_editable());
    let id = session.report().report_id.clone();
    assert_eq!(backend.store.puts().len(), 1);
    assert_eq!(shell.reports()[0].report_id, id);

    session.set_title("Night inspection").await.unwrap();
    assert_eq!(shell.close_editor(session).await, SyncStatus::Saved);

    assert_eq!(shell.screen(), &Screen::ReportList);
    assert_eq!(shell.reports()[0].title, "Night inspection");
    assert_eq!(backend.store.stored(&id).unwrap().title, "Night inspection");
    assert_eq!(backend.store.stored(&id).unwrap().owner_id, "u1");
}

#[tokio::test]
async fn sign_out_returns_to_sign_in() {
    let backend = backend();
    let mut shell = signed_in(&backend).await;

    shell.sign_out().await;
    assert_eq!(shell.screen(), &Screen::SignIn { error: None });
    assert!(shell.reports().is_empty());
    assert!(matches!(shell.refresh().await, Err(ShellError::SignedOut)));
}

#[tokio::test]
async fn sign_out_leaves_other_devices_signed_in() {
    let backend = backend();
    let mut laptop = signed_in(&backend).await;
    let mut phone = signed_in(&backend).await;

    laptop.sign_out().await;
    assert_eq!(backend.identity.revoked(), vec!["memory-refresh-1".to_string()]);

    phone.refresh().await.unwrap();
    assert_eq!(phone.screen(), &Screen::ReportList);
    assert_eq!(phone.reports().len(), 3);

    // A second sign-out has no session left to revoke
    laptop.sign_out().await;
    assert_eq!(backend.identity.revoked().len(), 1);
}
