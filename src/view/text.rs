//! Terminal adapter for [`PageView`]

use std::fmt;

use super::{ActivityCard, ActivityListView, AuthBarView, PageView, Roster, NO_PARTICIPANTS};
use crate::notify::Severity;

const RULE_WIDTH: usize = 60;

/// Whole page
pub struct TextPage<'a>(pub &'a PageView);

/// Just the login/teacher line
pub struct TextAuthBar<'a>(pub &'a AuthBarView);

/// Just the activity list
pub struct TextActivities<'a>(pub &'a ActivityListView);

impl fmt::Display for TextPage<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let page = self.0;

        writeln!(f, "Mergington High School Activities")?;
        writeln!(f, "{}", TextAuthBar(&page.auth_bar))?;
        writeln!(f, "{}", "=".repeat(RULE_WIDTH))?;
        write!(f, "{}", TextActivities(&page.activities))?;
        writeln!(f, "{}", "=".repeat(RULE_WIDTH))?;

        let form = &page.signup_form;
        if form.enabled {
            writeln!(
                f,
                "[{}] signup <email> <activity>   unregister <email> <activity>",
                form.button_label
            )?;
        } else {
            writeln!(f, "[{}] (disabled)", form.button_label)?;
        }

        if page.login_dialog.open {
            if let Some(message) = &page.login_dialog.message {
                writeln!(f, "Login: {}", message)?;
            }
        }

        if let Some(notification) = &page.notification {
            writeln!(f, "{}", notification_line(&notification.text, notification.severity))?;
        }

        Ok(())
    }
}

impl fmt::Display for TextAuthBar<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0.teacher_name {
            Some(name) => write!(f, "Logged in as {}  (logout)", name),
            None => write!(
                f,
                "Not logged in  (login <username>)  Teachers must log in to register or remove students."
            ),
        }
    }
}

impl fmt::Display for TextActivities<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            ActivityListView::Placeholder(message) => writeln!(f, "{}", message),
            ActivityListView::Cards(cards) => {
                for (i, card) in cards.iter().enumerate() {
                    if i > 0 {
                        writeln!(f, "{}", "-".repeat(RULE_WIDTH))?;
                    }
                    write_card(f, card)?;
                }
                Ok(())
            }
        }
    }
}

fn write_card(f: &mut fmt::Formatter<'_>, card: &ActivityCard) -> fmt::Result {
    writeln!(f, "{}", card.name)?;
    writeln!(f, "  {}", card.description)?;
    writeln!(f, "  Schedule: {}", card.schedule)?;
    writeln!(f, "  Availability: {} spots left", card.spots_left)?;

    match &card.roster {
        Roster::Empty => writeln!(f, "  {}", NO_PARTICIPANTS),
        Roster::Participants(rows) => {
            writeln!(f, "  Participants:")?;
            for row in rows {
                if row.remove_visible {
                    writeln!(f, "    - {}  [x]", row.email)?;
                } else {
                    writeln!(f, "    - {}", row.email)?;
                }
            }
            Ok(())
        }
    }
}

/// One-line rendering of a notification
pub fn notification_line(text: &str, severity: Severity) -> String {
    let marker = match severity {
        Severity::Success => "✓",
        Severity::Error => "✕",
        Severity::Info => "ℹ",
    };
    format!("{} {}", marker, text)
}
