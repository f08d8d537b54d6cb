//! Interactive shell
//!
//! Keeps one [`Controller`] alive across commands, the way a page stays
//! open between clicks. Each line is one user action; the action runs to
//! completion before the next line is read.

use std::io::{self, Write};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::controller::{ActionOutcome, Controller};
use crate::view::text::{notification_line, TextActivities, TextAuthBar, TextPage};
use crate::view::PageView;

pub const HELP: &str = "\
Commands:
  list                          reload and show all activities
  status                        re-check the login and show who it is
  login <username> <password>   log in as a teacher
  logout                        log out
  signup <email> <activity>     register a student
  unregister <email> <activity> remove a student
  help                          show this help
  quit                          leave the shell";

/// One parsed line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    List,
    Status,
    Login { username: String, password: String },
    Logout,
    Signup { email: String, activity: String },
    Unregister { email: String, activity: String },
    Help,
    Quit,
}

impl ShellCommand {
    /// Parse a line. Blank lines yield `Ok(None)`.
    ///
    /// Activity names may contain spaces, so the activity is everything after
    /// the email.
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Ok(None);
        };
        let rest: Vec<&str> = words.collect();

        let command = match verb.to_lowercase().as_str() {
            "list" | "refresh" => ShellCommand::List,
            "status" | "whoami" => ShellCommand::Status,
            "logout" => ShellCommand::Logout,
            "help" | "?" => ShellCommand::Help,
            "quit" | "exit" => ShellCommand::Quit,
            "login" => match rest.as_slice() {
                [username, password] => ShellCommand::Login {
                    username: username.to_string(),
                    password: password.to_string(),
                },
                _ => return Err("Usage: login <username> <password>".to_string()),
            },
            "signup" | "unregister" => {
                let (email, activity) = match rest.split_first() {
                    Some((email, activity)) if !activity.is_empty() => {
                        (email.to_string(), activity.join(" "))
                    }
                    _ => return Err(format!("Usage: {} <email> <activity>", verb)),
                };
                if verb.eq_ignore_ascii_case("signup") {
                    ShellCommand::Signup { email, activity }
                } else {
                    ShellCommand::Unregister { email, activity }
                }
            }
            other => return Err(format!("Unknown command: {} (try `help`)", other)),
        };

        Ok(Some(command))
    }
}

/// Run one command and print its result. Returns the action outcome for
/// commands that perform an action.
pub async fn execute<W: Write>(
    controller: &Controller,
    command: ShellCommand,
    out: &mut W,
) -> io::Result<Option<ActionOutcome>> {
    let outcome = match command {
        ShellCommand::List => {
            let page = controller.fetch_and_render().await;
            write!(out, "{}", TextPage(&page))?;
            return Ok(None);
        }
        ShellCommand::Status => {
            controller.session().refresh().await;
            let page = controller.render().await;
            writeln!(out, "{}", TextAuthBar(&page.auth_bar))?;
            return Ok(None);
        }
        ShellCommand::Help => {
            writeln!(out, "{}", HELP)?;
            return Ok(None);
        }
        ShellCommand::Quit => return Ok(None),
        ShellCommand::Login { username, password } => {
            controller.open_login().await;
            controller.login(&username, &password).await
        }
        ShellCommand::Logout => controller.logout().await,
        ShellCommand::Signup { email, activity } => controller.signup(&activity, &email).await,
        ShellCommand::Unregister { email, activity } => {
            controller.unregister(&activity, &email).await
        }
    };

    let page = controller.render().await;
    print_feedback(&page, out)?;
    if outcome.is_success() {
        write!(out, "{}", TextActivities(&page.activities))?;
    }
    Ok(Some(outcome))
}

fn print_feedback<W: Write>(page: &PageView, out: &mut W) -> io::Result<()> {
    if page.login_dialog.open {
        if let Some(message) = &page.login_dialog.message {
            writeln!(out, "Login: {}", message)?;
        }
    }
    if let Some(notification) = &page.notification {
        writeln!(out, "{}", notification_line(&notification.text, notification.severity))?;
    }
    Ok(())
}

/// Read commands from `input` until it ends or the user quits
pub async fn run<R, W>(controller: &Controller, input: R, out: &mut W) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let page = controller.init().await;
    write!(out, "{}", TextPage(&page))?;
    writeln!(out, "Type `help` for commands.")?;

    let mut lines = input.lines();
    loop {
        write!(out, "> ")?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match ShellCommand::parse(&line) {
            Ok(None) => continue,
            Ok(Some(ShellCommand::Quit)) => break,
            Ok(Some(command)) => {
                tracing::debug!(?command, "Shell command");
                execute(controller, command, out).await?;
            }
            Err(message) => writeln!(out, "{}", message)?,
        }
    }

    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::testing::FakeApi;
    use crate::api::{ApiError, MessageResponse, VerifyResponse};
    use crate::notify::Notifier;
    use crate::session::MemoryTokenStore;
    use std::sync::Arc;

    #[test]
    fn test_parse() {
        assert_eq!(ShellCommand::parse("   "), Ok(None));
        assert_eq!(ShellCommand::parse("LIST"), Ok(Some(ShellCommand::List)));
        assert_eq!(
            ShellCommand::parse("signup student@example.com Chess Club"),
            Ok(Some(ShellCommand::Signup {
                email: "student@example.com".into(),
                activity: "Chess Club".into(),
            }))
        );
        assert_eq!(
            ShellCommand::parse("unregister a@b.c  Basketball   Team"),
            Ok(Some(ShellCommand::Unregister {
                email: "a@b.c".into(),
                activity: "Basketball Team".into(),
            }))
        );
        assert_eq!(
            ShellCommand::parse("login diaz secret"),
            Ok(Some(ShellCommand::Login {
                username: "diaz".into(),
                password: "secret".into(),
            }))
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(ShellCommand::parse("signup a@b.c").is_err());
        assert!(ShellCommand::parse("login diaz").is_err());
        assert!(ShellCommand::parse("dance").unwrap_err().contains("Unknown command"));
    }

    #[tokio::test]
    async fn test_session_script() {
        let api = Arc::new(
            FakeApi::new()
                .with_verify(Ok(VerifyResponse {
                    teacher_name: "Ms. Díaz".into(),
                    username: None,
                }))
                .with_mutation(Err(ApiError::Unauthorized { detail: None })),
        );
        let c = Controller::new(
            api,
            Arc::new(MemoryTokenStore::with_token("tok")),
            Notifier::default(),
        );

        let input: &[u8] = b"status\nunregister michael@mergington.edu Chess Club\nstatus\nbogus\nquit\nlist\n";
        let mut out = Vec::new();
        run(&c, input, &mut out).await.unwrap();
        let out = String::from_utf8(out).unwrap();

        assert!(out.contains("Logged in as Ms. Díaz"));
        assert!(out.contains("✕ Authentication expired. Please log in again."));
        assert!(out.contains("Not logged in"));
        assert!(out.contains("Unknown command: bogus"));
        // Nothing after quit runs
        assert_eq!(out.matches("Mergington High School Activities").count(), 1);
    }

    #[tokio::test]
    async fn test_status_rechecks_token() {
        let api = Arc::new(FakeApi::new().with_verify(Ok(VerifyResponse {
            teacher_name: "Ms. Díaz".into(),
            username: None,
        })));
        let c = Controller::new(
            api.clone(),
            Arc::new(MemoryTokenStore::with_token("tok")),
            Notifier::default(),
        );
        c.init().await;

        // The server revokes the token between commands
        *api.verify.lock().unwrap() = Err(ApiError::Unauthorized { detail: None });

        let mut out = Vec::new();
        let outcome = execute(&c, ShellCommand::Status, &mut out).await.unwrap();

        assert_eq!(outcome, None);
        assert!(String::from_utf8(out).unwrap().starts_with("Not logged in"));
        assert_eq!(api.call_count("verify"), 2);
        assert_eq!(api.call_count("list"), 1);
    }

    #[tokio::test]
    async fn test_execute_reports_outcome() {
        let api = Arc::new(
            FakeApi::new()
                .with_verify(Ok(VerifyResponse {
                    teacher_name: "Mr. Park".into(),
                    username: None,
                }))
                .with_mutation(Ok(MessageResponse {
                    message: "Signed up a@b.c for Chess Club".into(),
                })),
        );
        let c = Controller::new(
            api,
            Arc::new(MemoryTokenStore::with_token("tok")),
            Notifier::default(),
        );
        c.init().await;

        let mut out = Vec::new();
        let outcome = execute(
            &c,
            ShellCommand::Signup {
                email: "a@b.c".into(),
                activity: "Chess Club".into(),
            },
            &mut out,
        )
        .await
        .unwrap();

        assert_eq!(outcome, Some(ActionOutcome::Completed));
        let out = String::from_utf8(out).unwrap();
        assert!(out.starts_with("✓ Signed up a@b.c for Chess Club\n"));
        assert!(out.contains("Chess Club\n"));
    }
}
