//! SessionAndView Controller
//!
//! Ties the session, the activity list, the signup form and the notifier
//! together. Every user action is one `async fn` that issues its request,
//! awaits the single response, and updates state; the page is re-rendered
//! from a fresh snapshot afterwards.
//!
//! Failures never escape as errors. They become notifications and state
//! transitions:
//!
//! | Failure | Reaction |
//! |---|---|
//! | transport | generic message, logged, no retry |
//! | 401 on a mutation | session expired, logged out |
//! | other non-success | server `detail` or a generic message |
//!
//! Activity fetches are ticketed: a response older than the newest applied
//! one is dropped, so overlapping refreshes cannot roll the list back.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

use crate::api::{ActivityApi, FailureKind, HttpActivityApi};
use crate::config::Config;
use crate::error::ClientResult;
use crate::notify::{Notifier, Severity};
use crate::session::{FileTokenStore, MemoryTokenStore, SessionManager, TokenStore};
use crate::view::{self, ListState, LoginDialog, PageView, SignupForm, ViewModel};

pub const EXPIRED_MESSAGE: &str = "Authentication expired. Please log in again.";
pub const GENERIC_ERROR: &str = "An error occurred";
pub const LOGGED_OUT_MESSAGE: &str = "Logged out successfully.";
pub const MISSING_FIELDS_MESSAGE: &str = "Please choose an activity and enter an email.";

/// How a user action ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Completed,
    /// Stopped client-side; no request was sent
    Refused,
    Failed,
    SessionExpired,
}

impl ActionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ActionOutcome::Completed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mutation {
    Signup,
    Unregister,
}

impl Mutation {
    fn name(self) -> &'static str {
        match self {
            Mutation::Signup => "signup",
            Mutation::Unregister => "unregister",
        }
    }

    fn login_required(self) -> &'static str {
        match self {
            Mutation::Signup => "Please log in as a teacher to register students.",
            Mutation::Unregister => "Please log in as a teacher to unregister students.",
        }
    }

    fn retry_prompt(self) -> &'static str {
        match self {
            Mutation::Signup => "Failed to sign up. Please try again.",
            Mutation::Unregister => "Failed to unregister. Please try again.",
        }
    }
}

struct ViewState {
    list: ListState,
    applied_ticket: u64,
    form: SignupForm,
    login: LoginDialog,
}

/// The client: session, activity view, mutations and notifications
pub struct Controller {
    api: Arc<dyn ActivityApi>,
    session: SessionManager,
    notifier: Notifier,
    view: RwLock<ViewState>,
    next_ticket: AtomicU64,
}

impl Controller {
    pub fn new(api: Arc<dyn ActivityApi>, store: Arc<dyn TokenStore>, notifier: Notifier) -> Self {
        Self {
            session: SessionManager::new(Arc::clone(&api), store),
            api,
            notifier,
            view: RwLock::new(ViewState {
                list: ListState::Loading,
                applied_ticket: 0,
                form: SignupForm::default(),
                login: LoginDialog::default(),
            }),
            next_ticket: AtomicU64::new(0),
        }
    }

    /// Wire up the HTTP client and token store described by `config`.
    /// `ephemeral` keeps the token in memory only.
    pub fn from_config(config: &Config, ephemeral: bool) -> ClientResult<Self> {
        let api = HttpActivityApi::new(config.client.api_config())?;

        let store: Arc<dyn TokenStore> = if ephemeral {
            Arc::new(MemoryTokenStore::default())
        } else {
            let path = config.client.token_path();
            tracing::debug!("Token file: {:?}", path);
            Arc::new(FileTokenStore::new(path))
        };

        Ok(Self::new(
            Arc::new(api),
            store,
            Notifier::new(config.notifications.dismiss_after()),
        ))
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Startup: pick up a stored token, verify it if present, then load the list
    pub async fn init(&self) -> PageView {
        if self.session.load_token().await.is_some() {
            self.session.refresh().await;
        } else {
            tracing::debug!("No stored token");
        }
        self.fetch_and_render().await
    }

    /// Re-fetch the activity collection and render.
    ///
    /// Success replaces the list and the selection options wholesale; failure
    /// replaces them with the error placeholder.
    pub async fn fetch_and_render(&self) -> PageView {
        let ticket = self.next_ticket.fetch_add(1, Ordering::SeqCst) + 1;
        let result = self.api.list_activities().await;

        {
            let mut view = self.view.write().await;
            if ticket < view.applied_ticket {
                tracing::debug!(
                    ticket,
                    applied = view.applied_ticket,
                    "Dropping out-of-order activity list"
                );
            } else {
                view.applied_ticket = ticket;
                view.list = match result {
                    Ok(activities) => {
                        tracing::debug!(count = activities.len(), "Activities loaded");
                        ListState::Loaded(activities)
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to fetch activities");
                        ListState::Failed
                    }
                };
            }
        }

        self.render().await
    }

    pub async fn render(&self) -> PageView {
        self.render_at(Instant::now()).await
    }

    pub async fn render_at(&self, now: Instant) -> PageView {
        view::render(&self.snapshot(now).await)
    }

    /// Immutable copy of everything the page depends on
    pub async fn snapshot(&self, now: Instant) -> ViewModel {
        let auth = self.session.auth().await;
        let view = self.view.read().await;

        ViewModel {
            list: view.list.clone(),
            auth,
            form: view.form.clone(),
            login: view.login.clone(),
            notification: self.notifier.current_at(now),
        }
    }

    pub async fn open_login(&self) {
        let mut view = self.view.write().await;
        view.login = LoginDialog {
            open: true,
            message: None,
        };
    }

    /// Close the login dialog and drop its message
    pub async fn close_login(&self) {
        self.view.write().await.login = LoginDialog::default();
    }

    /// Log in. Failures are reported on the login dialog, not the notifier.
    pub async fn login(&self, username: &str, password: &str) -> ActionOutcome {
        match self.session.login(username, password).await {
            Ok(auth) => {
                self.view.write().await.login = LoginDialog::default();
                self.notifier
                    .show(format!("Welcome, {}!", auth.teacher_name), Severity::Success);
                // Removal controls depend on auth; refresh the list
                self.fetch_and_render().await;
                ActionOutcome::Completed
            }
            Err(failure) => {
                let mut view = self.view.write().await;
                view.login = LoginDialog {
                    open: true,
                    message: Some(failure.message),
                };
                ActionOutcome::Failed
            }
        }
    }

    pub async fn logout(&self) -> ActionOutcome {
        self.session.logout().await;
        self.notifier.show(LOGGED_OUT_MESSAGE, Severity::Info);
        self.fetch_and_render().await;
        ActionOutcome::Completed
    }

    /// Register `email` for `activity`
    pub async fn signup(&self, activity: &str, email: &str) -> ActionOutcome {
        self.mutate(Mutation::Signup, activity, email).await
    }

    /// Remove `email` from `activity`
    pub async fn unregister(&self, activity: &str, email: &str) -> ActionOutcome {
        self.mutate(Mutation::Unregister, activity, email).await
    }

    async fn mutate(&self, mutation: Mutation, activity: &str, email: &str) -> ActionOutcome {
        let Some(token) = self.session.bearer().await else {
            tracing::warn!(action = mutation.name(), "Refused: not logged in");
            self.notifier.show(mutation.login_required(), Severity::Error);
            return ActionOutcome::Refused;
        };

        if mutation == Mutation::Signup {
            self.view.write().await.form = SignupForm {
                email: email.to_string(),
                activity: Some(activity.to_string()),
            };
        }

        if activity.trim().is_empty() || email.trim().is_empty() {
            tracing::warn!(action = mutation.name(), "Refused: missing activity or email");
            self.notifier.show(MISSING_FIELDS_MESSAGE, Severity::Error);
            return ActionOutcome::Refused;
        }

        let result = match mutation {
            Mutation::Signup => self.api.signup(&token, activity, email).await,
            Mutation::Unregister => self.api.unregister(&token, activity, email).await,
        };

        match result {
            Ok(response) => {
                tracing::info!(action = mutation.name(), %activity, %email, "{}", response.message);
                self.notifier.show(response.message, Severity::Success);
                if mutation == Mutation::Signup {
                    self.view.write().await.form = SignupForm::default();
                }
                self.fetch_and_render().await;
                ActionOutcome::Completed
            }
            Err(e) => match e.kind() {
                FailureKind::Authentication => {
                    tracing::warn!(action = mutation.name(), error = %e, "Token rejected");
                    if self.session.expire(&token).await {
                        self.notifier.show(EXPIRED_MESSAGE, Severity::Error);
                        ActionOutcome::SessionExpired
                    } else {
                        // Sent with a token a newer login has replaced
                        self.notifier.show(mutation.retry_prompt(), Severity::Error);
                        ActionOutcome::Failed
                    }
                }
                FailureKind::Domain => {
                    tracing::warn!(action = mutation.name(), error = %e, "Request rejected");
                    self.notifier
                        .show(e.detail().unwrap_or(GENERIC_ERROR), Severity::Error);
                    ActionOutcome::Failed
                }
                FailureKind::Transport => {
                    tracing::error!(action = mutation.name(), error = %e, "Request failed");
                    self.notifier.show(mutation.retry_prompt(), Severity::Error);
                    ActionOutcome::Failed
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::{sample_activities, FakeApi};
    use crate::api::{
        Activities, ApiError, ApiResult, LoginResponse, MessageResponse, VerifyResponse,
    };
    use crate::view::{ActivityListView, Roster, LOAD_FAILED_PLACEHOLDER};
    use async_trait::async_trait;

    fn verified(name: &str) -> ApiResult<VerifyResponse> {
        Ok(VerifyResponse {
            teacher_name: name.to_string(),
            username: None,
        })
    }

    fn controller(api: Arc<FakeApi>, store: Arc<MemoryTokenStore>) -> Controller {
        Controller::new(api, store, Notifier::default())
    }

    async fn logged_in(api: FakeApi) -> (Controller, Arc<FakeApi>, Arc<MemoryTokenStore>) {
        let api = Arc::new(api.with_verify(verified("Ms. Díaz")));
        let store = Arc::new(MemoryTokenStore::with_token("tok"));
        let c = controller(api.clone(), store.clone());
        c.init().await;
        (c, api, store)
    }

    fn removal_visible(page: &PageView) -> Vec<bool> {
        match &page.activities {
            ActivityListView::Cards(cards) => cards
                .iter()
                .flat_map(|card| match &card.roster {
                    Roster::Participants(rows) => rows.iter().map(|r| r.remove_visible).collect(),
                    Roster::Empty => Vec::new(),
                })
                .collect(),
            ActivityListView::Placeholder(_) => Vec::new(),
        }
    }

    fn notification_text(page: &PageView) -> Option<&str> {
        page.notification.as_ref().map(|n| n.text.as_str())
    }

    #[tokio::test]
    async fn test_init_without_token_skips_verify() {
        let api = Arc::new(FakeApi::new());
        let c = controller(api.clone(), Arc::new(MemoryTokenStore::default()));

        let page = c.init().await;

        assert_eq!(api.calls(), vec!["list"]);
        assert!(page.auth_bar.login_button_visible);
        assert!(!page.signup_form.enabled);
        assert!(removal_visible(&page).iter().all(|v| !v));
    }

    #[tokio::test]
    async fn test_init_with_rejected_token() {
        let api = Arc::new(FakeApi::new());
        let store = Arc::new(MemoryTokenStore::with_token("expired"));
        let c = controller(api.clone(), store.clone());

        let page = c.init().await;

        assert_eq!(api.calls(), vec!["verify expired", "list"]);
        assert_eq!(store.load().unwrap(), None);
        assert!(page.auth_bar.login_button_visible);
        assert!(!page.signup_form.enabled);
    }

    #[tokio::test]
    async fn test_init_with_valid_token() {
        let (c, _api, _store) = logged_in(FakeApi::new()).await;
        let page = c.render().await;

        assert_eq!(page.auth_bar.teacher_name.as_deref(), Some("Ms. Díaz"));
        assert!(page.signup_form.enabled);
        assert!(removal_visible(&page).iter().all(|v| *v));
    }

    #[tokio::test]
    async fn test_login_enables_controls() {
        let api = Arc::new(FakeApi::new().with_login(Ok(LoginResponse {
            token: "fresh".into(),
            teacher_name: "Ms. Díaz".into(),
            message: None,
        })));
        let store = Arc::new(MemoryTokenStore::default());
        let c = controller(api.clone(), store.clone());
        c.init().await;
        c.open_login().await;

        let outcome = c.login("diaz", "secret").await;
        let page = c.render().await;

        assert_eq!(outcome, ActionOutcome::Completed);
        assert_eq!(store.load().unwrap().as_deref(), Some("fresh"));
        assert_eq!(notification_text(&page), Some("Welcome, Ms. Díaz!"));
        assert!(page.signup_form.enabled);
        assert!(!page.login_dialog.open);
        assert!(removal_visible(&page).iter().all(|v| *v));
        assert_eq!(api.call_count("list"), 2);
    }

    #[tokio::test]
    async fn test_login_failure_stays_on_dialog() {
        let api = Arc::new(FakeApi::new());
        let store = Arc::new(MemoryTokenStore::default());
        let c = controller(api, store.clone());
        c.init().await;

        let outcome = c.login("diaz", "wrong").await;
        let page = c.render().await;

        assert_eq!(outcome, ActionOutcome::Failed);
        assert!(page.login_dialog.open);
        assert_eq!(page.login_dialog.message.as_deref(), Some("Invalid credentials"));
        assert!(page.notification.is_none());
        assert!(!page.signup_form.enabled);

        c.close_login().await;
        let page = c.render().await;
        assert!(!page.login_dialog.open);
        assert_eq!(page.login_dialog.message, None);
    }

    #[tokio::test]
    async fn test_logout() {
        let (c, api, store) = logged_in(FakeApi::new()).await;

        c.logout().await;
        let page = c.render().await;

        assert_eq!(store.load().unwrap(), None);
        assert_eq!(notification_text(&page), Some(LOGGED_OUT_MESSAGE));
        assert!(!page.signup_form.enabled);
        assert!(removal_visible(&page).iter().all(|v| !v));
        // verify at startup, then list twice; logout itself calls nothing
        assert_eq!(api.calls(), vec!["verify tok", "list", "list"]);
    }

    #[tokio::test]
    async fn test_fetch_and_render_is_idempotent() {
        let (c, _api, _store) = logged_in(FakeApi::new()).await;

        let first = c.fetch_and_render().await;
        let second = c.fetch_and_render().await;

        assert_eq!(first.activities, second.activities);
        assert_eq!(first.signup_form.options, second.signup_form.options);
    }

    #[tokio::test]
    async fn test_capacity_tracks_latest_fetch() {
        let (c, api, _store) = logged_in(FakeApi::new()).await;

        let mut updated = sample_activities().into_inner();
        updated[0].participants.push("new@mergington.edu".into());
        api.set_activities(Ok(Activities::new(updated)));

        let page = c.fetch_and_render().await;
        match &page.activities {
            ActivityListView::Cards(cards) => assert_eq!(cards[0].spots_left, 9),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_failure_shows_placeholder() {
        let api = Arc::new(
            FakeApi::new().with_activities(Err(ApiError::Transport("connection refused".into()))),
        );
        let c = controller(api, Arc::new(MemoryTokenStore::default()));

        let page = c.init().await;

        assert_eq!(
            page.activities,
            ActivityListView::Placeholder(LOAD_FAILED_PLACEHOLDER.to_string())
        );
    }

    #[tokio::test]
    async fn test_signup_while_logged_out_sends_nothing() {
        let api = Arc::new(FakeApi::new());
        let c = controller(api.clone(), Arc::new(MemoryTokenStore::default()));

        let outcome = c.signup("Chess Club", "student@example.com").await;
        let page = c.render().await;

        assert_eq!(outcome, ActionOutcome::Refused);
        assert!(api.calls().is_empty());
        assert_eq!(
            notification_text(&page),
            Some("Please log in as a teacher to register students.")
        );

        c.unregister("Chess Club", "michael@mergington.edu").await;
        assert!(api.calls().is_empty());
        assert_eq!(
            notification_text(&c.render().await),
            Some("Please log in as a teacher to unregister students.")
        );
    }

    #[tokio::test]
    async fn test_signup_requires_both_fields() {
        let (c, api, _store) = logged_in(FakeApi::new()).await;

        let outcome = c.signup("Chess Club", "  ").await;

        assert_eq!(outcome, ActionOutcome::Refused);
        assert_eq!(api.call_count("signup"), 0);
        assert_eq!(notification_text(&c.render().await), Some(MISSING_FIELDS_MESSAGE));
    }

    #[tokio::test]
    async fn test_signup_success() {
        let (c, api, _store) = logged_in(FakeApi::new().with_mutation(Ok(MessageResponse {
            message: "Signed up student@example.com for Chess Club".into(),
        })))
        .await;

        let outcome = c.signup("Chess Club", "student@example.com").await;
        let page = c.render().await;

        assert_eq!(outcome, ActionOutcome::Completed);
        assert_eq!(
            notification_text(&page),
            Some("Signed up student@example.com for Chess Club")
        );
        assert_eq!(page.signup_form.email, "");
        assert_eq!(page.signup_form.selected, None);
        assert!(api
            .calls()
            .contains(&"signup tok Chess Club student@example.com".to_string()));
        assert_eq!(api.call_count("list"), 2);
    }

    #[tokio::test]
    async fn test_signup_rejected_keeps_form() {
        let (c, api, _store) = logged_in(FakeApi::new().with_mutation(Err(ApiError::Rejected {
            status: 400,
            detail: Some("Student is already signed up".into()),
        })))
        .await;

        let outcome = c.signup("Chess Club", "michael@mergington.edu").await;
        let page = c.render().await;

        assert_eq!(outcome, ActionOutcome::Failed);
        assert_eq!(notification_text(&page), Some("Student is already signed up"));
        assert_eq!(page.signup_form.email, "michael@mergington.edu");
        assert_eq!(page.signup_form.selected.as_deref(), Some("Chess Club"));
        assert!(page.signup_form.enabled);
        assert_eq!(api.call_count("list"), 1);
    }

    #[tokio::test]
    async fn test_rejection_without_detail_uses_fallback() {
        let (c, _api, _store) = logged_in(FakeApi::new().with_mutation(Err(ApiError::Rejected {
            status: 500,
            detail: None,
        })))
        .await;

        c.unregister("Chess Club", "michael@mergington.edu").await;
        assert_eq!(notification_text(&c.render().await), Some(GENERIC_ERROR));
    }

    #[tokio::test]
    async fn test_unauthorized_expires_session() {
        for unregister in [false, true] {
            let (c, api, store) = logged_in(FakeApi::new().with_mutation(Err(
                ApiError::Unauthorized {
                    detail: Some("Token expired".into()),
                },
            )))
            .await;

            let outcome = if unregister {
                c.unregister("Chess Club", "michael@mergington.edu").await
            } else {
                c.signup("Chess Club", "student@example.com").await
            };
            let page = c.render().await;

            assert_eq!(outcome, ActionOutcome::SessionExpired);
            assert_eq!(store.load().unwrap(), None);
            assert_eq!(c.session().token().await, None);
            assert_eq!(notification_text(&page), Some(EXPIRED_MESSAGE));
            assert!(page.auth_bar.login_button_visible);
            assert!(!page.signup_form.enabled);
            assert!(removal_visible(&page).iter().all(|v| !v));
            assert_eq!(api.call_count("list"), 1);
        }
    }

    #[tokio::test]
    async fn test_transport_failure_messages() {
        let (c, _api, store) =
            logged_in(FakeApi::new().with_mutation(Err(ApiError::Transport("reset".into())))).await;

        assert_eq!(c.signup("Chess Club", "a@b.c").await, ActionOutcome::Failed);
        assert_eq!(
            notification_text(&c.render().await),
            Some("Failed to sign up. Please try again.")
        );

        assert_eq!(c.unregister("Chess Club", "a@b.c").await, ActionOutcome::Failed);
        assert_eq!(
            notification_text(&c.render().await),
            Some("Failed to unregister. Please try again.")
        );

        // A network failure is not a session failure
        assert_eq!(store.load().unwrap().as_deref(), Some("tok"));
    }

    /// Holds each activity request until the test releases it
    struct GatedApi {
        pending: std::sync::Mutex<Vec<Option<tokio::sync::oneshot::Sender<Activities>>>>,
    }

    impl GatedApi {
        fn new() -> Self {
            Self {
                pending: std::sync::Mutex::new(Vec::new()),
            }
        }

        async fn wait_for_requests(&self, n: usize) {
            while self.pending.lock().unwrap().len() < n {
                tokio::task::yield_now().await;
            }
        }

        fn release(&self, index: usize, activities: Activities) {
            let tx = self.pending.lock().unwrap()[index].take().unwrap();
            tx.send(activities).unwrap();
        }
    }

    #[async_trait]
    impl ActivityApi for GatedApi {
        async fn list_activities(&self) -> ApiResult<Activities> {
            let (tx, rx) = tokio::sync::oneshot::channel();
            self.pending.lock().unwrap().push(Some(tx));
            rx.await.map_err(|e| ApiError::Transport(e.to_string()))
        }

        async fn login(&self, _: &str, _: &str) -> ApiResult<LoginResponse> {
            Err(ApiError::Transport("unused".into()))
        }

        async fn verify(&self, _: &str) -> ApiResult<VerifyResponse> {
            Err(ApiError::Transport("unused".into()))
        }

        async fn signup(&self, _: &str, _: &str, _: &str) -> ApiResult<MessageResponse> {
            Err(ApiError::Transport("unused".into()))
        }

        async fn unregister(&self, _: &str, _: &str, _: &str) -> ApiResult<MessageResponse> {
            Err(ApiError::Transport("unused".into()))
        }
    }

    #[tokio::test]
    async fn test_stale_fetch_does_not_overwrite_newer() {
        let api = Arc::new(GatedApi::new());
        let c = Arc::new(Controller::new(
            api.clone(),
            Arc::new(MemoryTokenStore::default()),
            Notifier::default(),
        ));

        let older = {
            let c = Arc::clone(&c);
            tokio::spawn(async move { c.fetch_and_render().await })
        };
        api.wait_for_requests(1).await;

        let newer = {
            let c = Arc::clone(&c);
            tokio::spawn(async move { c.fetch_and_render().await })
        };
        api.wait_for_requests(2).await;

        let fresh = sample_activities();
        api.release(1, fresh.clone());
        newer.await.unwrap();

        api.release(0, Activities::default());
        older.await.unwrap();

        let page = c.render().await;
        assert_eq!(page.signup_form.options, fresh.names());
    }

    /// Accepts any token, issues "new" on login, and holds the first signup
    /// until the test supplies its response
    struct SlowSignupApi {
        response: std::sync::Mutex<Option<tokio::sync::oneshot::Receiver<ApiResult<MessageResponse>>>>,
        signup_sent: std::sync::atomic::AtomicBool,
    }

    impl SlowSignupApi {
        fn new(response: tokio::sync::oneshot::Receiver<ApiResult<MessageResponse>>) -> Self {
            Self {
                response: std::sync::Mutex::new(Some(response)),
                signup_sent: std::sync::atomic::AtomicBool::new(false),
            }
        }

        async fn wait_for_signup(&self) {
            while !self.signup_sent.load(Ordering::SeqCst) {
                tokio::task::yield_now().await;
            }
        }
    }

    #[async_trait]
    impl ActivityApi for SlowSignupApi {
        async fn list_activities(&self) -> ApiResult<Activities> {
            Ok(sample_activities())
        }

        async fn login(&self, _: &str, _: &str) -> ApiResult<LoginResponse> {
            Ok(LoginResponse {
                token: "new".into(),
                teacher_name: "Ms. Díaz".into(),
                message: None,
            })
        }

        async fn verify(&self, _: &str) -> ApiResult<VerifyResponse> {
            verified("Ms. Díaz")
        }

        async fn signup(&self, _: &str, _: &str, _: &str) -> ApiResult<MessageResponse> {
            let response = self.response.lock().unwrap().take().unwrap();
            self.signup_sent.store(true, Ordering::SeqCst);
            response
                .await
                .map_err(|e| ApiError::Transport(e.to_string()))?
        }

        async fn unregister(&self, _: &str, _: &str, _: &str) -> ApiResult<MessageResponse> {
            Err(ApiError::Transport("unused".into()))
        }
    }

    #[tokio::test]
    async fn test_late_unauthorized_keeps_newer_login() {
        let (respond, response) = tokio::sync::oneshot::channel();
        let api = Arc::new(SlowSignupApi::new(response));
        let store = Arc::new(MemoryTokenStore::with_token("old"));
        let c = Arc::new(Controller::new(api.clone(), store.clone(), Notifier::default()));
        c.init().await;

        let pending = {
            let c = Arc::clone(&c);
            tokio::spawn(async move { c.signup("Chess Club", "student@example.com").await })
        };
        api.wait_for_signup().await;

        assert_eq!(c.login("diaz", "pw").await, ActionOutcome::Completed);
        respond
            .send(Err(ApiError::Unauthorized {
                detail: Some("Token expired".into()),
            }))
            .unwrap();
        let outcome = pending.await.unwrap();
        let page = c.render().await;

        assert_eq!(outcome, ActionOutcome::Failed);
        assert_eq!(c.session().token().await.as_deref(), Some("new"));
        assert_eq!(store.load().unwrap().as_deref(), Some("new"));
        assert!(page.signup_form.enabled);
        assert_eq!(
            notification_text(&page),
            Some("Failed to sign up. Please try again.")
        );
    }
}
