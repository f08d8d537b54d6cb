//! Activity View
//!
//! Pure rendering of the page from an immutable [`ViewModel`] snapshot.
//!
//! Nothing here touches the network or the terminal: [`render`] turns a
//! snapshot into a [`PageView`] description, and [`text`] prints one. Every
//! auth-dependent control (form enablement, removal buttons, login button)
//! is derived from the same `AuthState` in the same snapshot.

pub mod text;

use crate::api::Activities;
use crate::notify::{Notification, Severity};
use crate::session::AuthState;

pub const LOADING_PLACEHOLDER: &str = "Loading activities...";
pub const LOAD_FAILED_PLACEHOLDER: &str = "Failed to load activities. Please try again later.";
pub const NO_PARTICIPANTS: &str = "No participants yet";
pub const SIGNUP_LABEL: &str = "Sign Up";
pub const SIGNUP_LABEL_LOCKED: &str = "Sign Up (Teacher Login Required)";

// ============ Model ============

/// What the last activity fetch produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListState {
    Loading,
    Loaded(Activities),
    Failed,
}

/// Contents of the signup form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignupForm {
    pub email: String,
    pub activity: Option<String>,
}

/// The login dialog and its inline message
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoginDialog {
    pub open: bool,
    pub message: Option<String>,
}

/// Everything one render needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewModel {
    pub list: ListState,
    pub auth: AuthState,
    pub form: SignupForm,
    pub login: LoginDialog,
    pub notification: Option<Notification>,
}

// ============ View ============

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageView {
    pub auth_bar: AuthBarView,
    pub activities: ActivityListView,
    pub signup_form: SignupFormView,
    pub login_dialog: LoginDialogView,
    pub notification: Option<NotificationView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthBarView {
    pub login_button_visible: bool,
    /// Present only while logged in
    pub teacher_name: Option<String>,
    /// "Teacher login required" notice
    pub auth_notice_visible: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivityListView {
    /// Single message in place of the list
    Placeholder(String),
    Cards(Vec<ActivityCard>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityCard {
    pub name: String,
    pub description: String,
    pub schedule: String,
    pub spots_left: i64,
    pub roster: Roster,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Roster {
    Empty,
    Participants(Vec<ParticipantRow>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantRow {
    pub email: String,
    pub activity: String,
    pub remove_visible: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignupFormView {
    pub enabled: bool,
    pub button_label: String,
    /// Activity names offered by the selection control
    pub options: Vec<String>,
    pub email: String,
    pub selected: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginDialogView {
    pub open: bool,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationView {
    pub text: String,
    pub severity: Severity,
}

/// Render a snapshot into a page description
pub fn render(model: &ViewModel) -> PageView {
    let authenticated = model.auth.authenticated;

    let (activities, options) = match &model.list {
        ListState::Loading => (
            ActivityListView::Placeholder(LOADING_PLACEHOLDER.to_string()),
            Vec::new(),
        ),
        ListState::Failed => (
            ActivityListView::Placeholder(LOAD_FAILED_PLACEHOLDER.to_string()),
            Vec::new(),
        ),
        ListState::Loaded(list) => (
            ActivityListView::Cards(list.iter().map(|a| render_card(a, authenticated)).collect()),
            list.names(),
        ),
    };

    let selected = model
        .form
        .activity
        .clone()
        .filter(|name| options.contains(name));

    PageView {
        auth_bar: AuthBarView {
            login_button_visible: !authenticated,
            teacher_name: authenticated.then(|| model.auth.teacher_name.clone()),
            auth_notice_visible: !authenticated,
        },
        activities,
        signup_form: SignupFormView {
            enabled: authenticated,
            button_label: if authenticated {
                SIGNUP_LABEL
            } else {
                SIGNUP_LABEL_LOCKED
            }
            .to_string(),
            options,
            email: model.form.email.clone(),
            selected,
        },
        login_dialog: LoginDialogView {
            open: model.login.open,
            message: model.login.message.clone(),
        },
        notification: model.notification.as_ref().map(|n| NotificationView {
            text: n.text.clone(),
            severity: n.severity,
        }),
    }
}

fn render_card(activity: &crate::api::Activity, authenticated: bool) -> ActivityCard {
    let roster = if activity.participants.is_empty() {
        Roster::Empty
    } else {
        Roster::Participants(
            activity
                .participants
                .iter()
                .map(|email| ParticipantRow {
                    email: email.clone(),
                    activity: activity.name.clone(),
                    remove_visible: authenticated,
                })
                .collect(),
        )
    };

    ActivityCard {
        name: activity.name.clone(),
        description: activity.description.clone(),
        schedule: activity.schedule.clone(),
        spots_left: activity.spots_left(),
        roster,
    }
}
