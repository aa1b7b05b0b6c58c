use std::time::Duration;

use crate::error::ShellError;
use crate::session::EditorSession;
use crate::sync::{SyncStatus, DEFAULT_DEBOUNCE};
use fieldnote_shared::{AppContext, AppServices, AuthSession, ConfigError, Principal, Report};

/// What the app is showing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    /// Backend parameters are missing; nothing else is reachable
    NotConfigured { missing: Vec<&'static str> },
    SignIn { error: Option<String> },
    ReportList,
    Editor { report_id: String, read_only: bool },
}

/// Top-level navigation: sign-in gate, report list, and hand-off to the editor.
///
/// The shell keeps the list of reports. An open report lives in the
/// [`EditorSession`] handed out by `create_report`/`open_report` and comes
/// back through `close_editor`.
pub struct Shell {
    services: Option<AppServices>,
    auth: Option<AuthSession>,
    screen: Screen,
    reports: Vec<Report>,
    debounce: Duration,
}

impl Shell {
    pub fn new(services: AppServices) -> Self {
        Self {
            services: Some(services),
            auth: None,
            screen: Screen::SignIn { error: None },
            reports: Vec::new(),
            debounce: DEFAULT_DEBOUNCE,
        }
    }

    /// First screen: sign-in when the backend is configured, otherwise the
    /// blocking not-configured state
    pub fn start(services: Result<AppServices, ConfigError>) -> Self {
        match services {
            Ok(services) => Self::new(services),
            Err(e) => Self::not_configured(&e),
        }
    }

    /// Blocking state shown when configuration is incomplete
    pub fn not_configured(error: &ConfigError) -> Self {
        let ConfigError::Missing(missing) = error;
        tracing::error!("⚠️ {}", error);
        Self {
            services: None,
            auth: None,
            screen: Screen::NotConfigured {
                missing: missing.clone(),
            },
            reports: Vec::new(),
            debounce: DEFAULT_DEBOUNCE,
        }
    }

    pub fn with_debounce(mut self, delay: Duration) -> Self {
        self.debounce = delay;
        self
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn reports(&self) -> &[Report] {
        &self.reports
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.auth.as_ref().map(|a| &a.principal)
    }

    fn services(&self) -> Result<&AppServices, ShellError> {
        match (&self.services, &self.screen) {
            (Some(services), _) => Ok(services),
            (None, Screen::NotConfigured { missing }) => Err(ConfigError::Missing(missing.clone()).into()),
            (None, _) => Err(ConfigError::Missing(Vec::new()).into()),
        }
    }

    fn context(&self) -> Result<AppContext, ShellError> {
        let services = self.services()?;
        let auth = self.auth.as_ref().ok_or(ShellError::SignedOut)?;
        Ok(AppContext::new(services.clone(), auth.principal.clone()))
    }

    /// On failure the sign-in screen shows the provider's message
    pub async fn sign_in(&mut self, email: &str, password: &str) -> Result<(), ShellError> {
        let identity = self.services()?.identity.clone();
        match identity.sign_in(email.trim(), password).await {
            Ok(session) => {
                tracing::info!("🔐 Signed in as {}", session.principal.email);
                self.auth = Some(session);
                self.screen = Screen::ReportList;
                if let Err(e) = self.refresh().await {
                    tracing::warn!("Report list not loaded after sign-in: {}", e);
                }
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Sign-in rejected: {}", e);
                self.screen = Screen::SignIn {
                    error: Some(e.to_string()),
                };
                Err(e.into())
            }
        }
    }

    /// Reload every report, newest first
    pub async fn refresh(&mut self) -> Result<(), ShellError> {
        let ctx = self.context()?;
        match ctx.store().list().await {
            Ok(reports) => {
                tracing::info!("📋 Loaded {} reports", reports.len());
                self.reports = reports;
                Ok(())
            }
            Err(e) => {
                ctx.notifier().error(format!("Could not load reports: {}", e));
                Err(e.into())
            }
        }
    }

    /// Create and persist an empty report owned by the current user, then open it
    pub async fn create_report(&mut self) -> Result<EditorSession, ShellError> {
        let ctx = self.context()?;
        let report = Report::new_for(&ctx.principal);
        if let Err(e) = ctx.store().put(&report).await {
            tracing::error!("❌ Creating report failed: {}", e);
            ctx.notifier().error(format!("Could not create report: {}", e));
            return Err(e.into());
        }
        tracing::info!("✅ Created report {}", report.report_id);

        self.reports.insert(0, report.clone());
        self.screen = Screen::Editor {
            report_id: report.report_id.clone(),
            read_only: false,
        };
        Ok(EditorSession::with_debounce(ctx, report, self.debounce))
    }

    /// Open any report; it is read-only unless the current user owns it
    pub fn open_report(&mut self, report_id: &str) -> Result<EditorSession, ShellError> {
        let ctx = self.context()?;
        let report = self
            .reports
            .iter()
            .find(|r| r.report_id == report_id)
            .cloned()
            .ok_or_else(|| ShellError::UnknownReport(report_id.to_string()))?;

        let session = EditorSession::with_debounce(ctx, report, self.debounce);
        self.screen = Screen::Editor {
            report_id: report_id.to_string(),
            read_only: !session.is_editable(),
        };
        Ok(session)
    }

    /// Save what is pending, take the edited copy back into the list and
    /// return to it
    pub async fn close_editor(&mut self, mut session: EditorSession) -> SyncStatus {
        let status = session.leave().await;
        let report = session.into_report();
        match self.reports.iter_mut().find(|r| r.report_id == report.report_id) {
            Some(existing) => *existing = report,
            None => self.reports.insert(0, report),
        }
        self.screen = Screen::ReportList;
        status
    }

    /// Optimistic: gone from the list at once, put back if the store refuses
    pub async fn delete_report(&mut self, report_id: &str) -> Result<(), ShellError> {
        let ctx = self.context()?;
        let index = self
            .reports
            .iter()
            .position(|r| r.report_id == report_id)
            .ok_or_else(|| ShellError::UnknownReport(report_id.to_string()))?;
        if !self.reports[index].is_owned_by(&ctx.principal) {
            return Err(ShellError::NotOwner);
        }

        let removed = self.reports.remove(index);
        match ctx.store().delete(report_id).await {
            Ok(()) => {
                tracing::info!("🗑️ Deleted report {}", report_id);
                ctx.notifier().info("Report deleted");
                Ok(())
            }
            Err(e) => {
                tracing::error!("❌ Deleting report {} failed: {}", report_id, e);
                let at = index.min(self.reports.len());
                self.reports.insert(at, removed);
                ctx.notifier().error(format!("Could not delete report: {}", e));
                Err(e.into())
            }
        }
    }

    pub async fn sign_out(&mut self) {
        if let (Some(auth), Some(services)) = (self.auth.take(), self.services.as_ref()) {
            if let Err(e) = services.identity.sign_out(&auth).await {
                tracing::warn!("Sign-out not confirmed by provider: {}", e);
            }
            tracing::info!("👋 Signed out {}", auth.principal.email);
        }
        self.reports.clear();
        if self.services.is_some() {
            self.screen = Screen::SignIn { error: None };
        }
    }
}
