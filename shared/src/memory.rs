//! In-memory gateways that record every call. Test support only.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use crate::auth::{AuthSession, IdentityProvider};
use crate::context::AppServices;
use crate::error::{AuthError, GatewayError};
use crate::gateways::{BlobStorage, DocumentStore};
use crate::notify::Notifier;
use fieldnote_atoms::media::image_path;
use fieldnote_atoms::reports::{model::sort_newest_first, Report};
use fieldnote_atoms::users::Principal;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

#[derive(Default)]
pub struct InMemoryReportStore {
    reports: Mutex<Vec<Report>>,
    puts: Mutex<Vec<Report>>,
    deletes: Mutex<Vec<String>>,
    list_calls: AtomicUsize,
    fail_puts: AtomicBool,
    fail_deletes: AtomicBool,
    put_delay: Mutex<Option<Duration>>,
}

impl InMemoryReportStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reports(reports: Vec<Report>) -> Self {
        let store = Self::default();
        *lock(&store.reports) = reports;
        store
    }

    /// Every report passed to `put`, in call order
    pub fn puts(&self) -> Vec<Report> {
        lock(&self.puts).clone()
    }

    pub fn deletes(&self) -> Vec<String> {
        lock(&self.deletes).clone()
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn stored(&self, report_id: &str) -> Option<Report> {
        lock(&self.reports).iter().find(|r| r.report_id == report_id).cloned()
    }

    pub fn set_fail_puts(&self, fail: bool) {
        self.fail_puts.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Makes each `put` take this long (tokio time)
    pub fn set_put_delay(&self, delay: Option<Duration>) {
        *lock(&self.put_delay) = delay;
    }
}

#[async_trait]
impl DocumentStore for InMemoryReportStore {
    async fn list(&self) -> Result<Vec<Report>, GatewayError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let mut reports = lock(&self.reports).clone();
        sort_newest_first(&mut reports);
        Ok(reports)
    }

    async fn put(&self, report: &Report) -> Result<(), GatewayError> {
        lock(&self.puts).push(report.clone());
        let delay = *lock(&self.put_delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(GatewayError::Store("put rejected".to_string()));
        }
        let mut reports = lock(&self.reports);
        match reports.iter_mut().find(|r| r.report_id == report.report_id) {
            Some(existing) => *existing = report.clone(),
            None => reports.push(report.clone()),
        }
        Ok(())
    }

    async fn delete(&self, report_id: &str) -> Result<(), GatewayError> {
        lock(&self.deletes).push(report_id.to_string());
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(GatewayError::Store("delete rejected".to_string()));
        }
        lock(&self.reports).retain(|r| r.report_id != report_id);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryBlobStorage {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    uploads: AtomicUsize,
    deletes: Mutex<Vec<String>>,
    fail_uploads: AtomicBool,
    fail_deletes: AtomicBool,
    broken_paths: Mutex<HashSet<String>>,
}

impl InMemoryBlobStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a blob at a known path
    pub fn insert(&self, path: impl Into<String>, bytes: Vec<u8>) {
        lock(&self.blobs).insert(path.into(), bytes);
    }

    pub fn contains(&self, path: &str) -> bool {
        lock(&self.blobs).contains_key(path)
    }

    pub fn upload_calls(&self) -> usize {
        self.uploads.load(Ordering::SeqCst)
    }

    pub fn deletes(&self) -> Vec<String> {
        lock(&self.deletes).clone()
    }

    pub fn set_fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// `fetch` on this path fails even if a blob exists
    pub fn break_path(&self, path: impl Into<String>) {
        lock(&self.broken_paths).insert(path.into());
    }
}

#[async_trait]
impl BlobStorage for InMemoryBlobStorage {
    async fn upload(&self, jpeg: Vec<u8>, user_id: &str, report_id: &str) -> Result<String, GatewayError> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(GatewayError::Storage("upload rejected".to_string()));
        }
        let path = image_path(user_id, report_id);
        lock(&self.blobs).insert(path.clone(), jpeg);
        Ok(path)
    }

    async fn resolve(&self, path: &str) -> Result<String, GatewayError> {
        if !self.contains(path) {
            return Err(GatewayError::Storage(format!("no object at {}", path)));
        }
        Ok(format!("memory://{}", path))
    }

    async fn fetch(&self, path: &str) -> Result<Vec<u8>, GatewayError> {
        if lock(&self.broken_paths).contains(path) {
            return Err(GatewayError::Storage(format!("fetch failed for {}", path)));
        }
        lock(&self.blobs)
            .get(path)
            .cloned()
            .ok_or_else(|| GatewayError::Storage(format!("no object at {}", path)))
    }

    async fn delete(&self, path: &str) -> Result<(), GatewayError> {
        lock(&self.deletes).push(path.to_string());
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(GatewayError::Storage("delete rejected".to_string()));
        }
        lock(&self.blobs).remove(path);
        Ok(())
    }
}

/// Accepts exactly one email/password pair
pub struct StaticIdentity {
    principal: Principal,
    password: String,
    issued: Mutex<u32>,
    revoked: Mutex<Vec<String>>,
}

impl StaticIdentity {
    pub fn new(principal: Principal, password: impl Into<String>) -> Self {
        Self {
            principal,
            password: password.into(),
            issued: Mutex::new(0),
            revoked: Mutex::new(Vec::new()),
        }
    }

    /// Refresh tokens revoked by sign-out, in order
    pub fn revoked(&self) -> Vec<String> {
        lock(&self.revoked).clone()
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        if email != self.principal.email || password != self.password {
            return Err(AuthError::InvalidCredentials);
        }
        let n = {
            let mut issued = lock(&self.issued);
            *issued += 1;
            *issued
        };
        Ok(AuthSession {
            principal: self.principal.clone(),
            access_token: format!("memory-access-{}", n),
            refresh_token: Some(format!("memory-refresh-{}", n)),
        })
    }

    async fn sign_out(&self, session: &AuthSession) -> Result<(), AuthError> {
        if let Some(token) = &session.refresh_token {
            lock(&self.revoked).push(token.clone());
        }
        Ok(())
    }
}

/// In-memory services wired together, with handles kept for assertions
pub struct TestBackend {
    pub store: Arc<InMemoryReportStore>,
    pub storage: Arc<InMemoryBlobStorage>,
    pub identity: Arc<StaticIdentity>,
    pub services: AppServices,
    pub toasts: tokio::sync::mpsc::UnboundedReceiver<crate::notify::Toast>,
}

impl TestBackend {
    pub fn new(store: InMemoryReportStore, identity: StaticIdentity) -> Self {
        let store = Arc::new(store);
        let storage = Arc::new(InMemoryBlobStorage::new());
        let identity = Arc::new(identity);
        let (notifier, toasts) = Notifier::channel();
        let services = AppServices {
            store: store.clone(),
            storage: storage.clone(),
            identity: identity.clone(),
            notifier,
        };
        Self {
            store,
            storage,
            identity,
            services,
            toasts,
        }
    }

    /// Drain every toast received so far
    pub fn drain_toasts(&mut self) -> Vec<crate::notify::Toast> {
        let mut out = Vec::new();
        while let Ok(toast) = self.toasts.try_recv() {
            out.push(toast);
        }
        out
    }
}
