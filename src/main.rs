//! signup-desk CLI
//!
//! Command-line front end for the activity signup service:
//! - List activities and rosters
//! - Log in / log out as a teacher
//! - Register and unregister students
//! - Interactive shell

use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;

use signup_desk::config::{generate_default_config, Config};
use signup_desk::controller::Controller;
use signup_desk::shell::{self, ShellCommand};
use signup_desk::view::text::TextPage;

#[derive(Parser)]
#[command(name = "signup-desk")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Manage extracurricular activity signups")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Signup service URL (overrides config)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Config file (default: platform config dir, then ./signup-desk.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Keep the login token in memory only
    #[arg(long, global = true)]
    pub ephemeral: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show all activities with their participants
    List,

    /// Log in as a teacher
    Login {
        username: String,
        /// Password (prompted if omitted)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Forget the stored login
    Logout,

    /// Show who is logged in
    Status,

    /// Register a student for an activity
    Signup {
        email: String,
        /// Activity name (may span several words)
        #[arg(required = true, num_args = 1..)]
        activity: Vec<String>,
    },

    /// Remove a student from an activity
    Unregister {
        email: String,
        /// Activity name (may span several words)
        #[arg(required = true, num_args = 1..)]
        activity: Vec<String>,
    },

    /// Interactive session
    Shell,

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    if let Some(url) = &cli.api_url {
        config.client.api_url = url.clone();
    }

    signup_desk::logging::init(&config.logging);
    tracing::debug!("signup-desk v{} against {}", env!("CARGO_PKG_VERSION"), config.client.api_url);

    if let Commands::Config { output } = &cli.command {
        let content = generate_default_config();
        match output {
            Some(path) => {
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(path, &content)?;
                println!("Config written to {:?}", path);
            }
            None => print!("{}", content),
        }
        return Ok(());
    }

    let controller = Controller::from_config(&config, cli.ephemeral)?;
    let mut stdout = std::io::stdout();

    let command = match cli.command {
        Commands::List => {
            let page = controller.init().await;
            print!("{}", TextPage(&page));
            return Ok(());
        }
        Commands::Status => {
            controller.session().load_token().await;
            shell::execute(&controller, ShellCommand::Status, &mut stdout).await?;
            return Ok(());
        }
        Commands::Shell => {
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            shell::run(&controller, stdin, &mut stdout).await?;
            return Ok(());
        }
        Commands::Login { username, password } => {
            let password = match password {
                Some(p) => p,
                None => prompt_password(&username)?,
            };
            ShellCommand::Login { username, password }
        }
        Commands::Logout => ShellCommand::Logout,
        Commands::Signup { email, activity } => {
            controller.init().await;
            ShellCommand::Signup {
                email,
                activity: activity.join(" "),
            }
        }
        Commands::Unregister { email, activity } => {
            controller.init().await;
            ShellCommand::Unregister {
                email,
                activity: activity.join(" "),
            }
        }
        Commands::Config { .. } => return Ok(()),
    };

    let outcome = shell::execute(&controller, command, &mut stdout).await?;
    if outcome.is_some_and(|o| !o.is_success()) {
        std::process::exit(1);
    }

    Ok(())
}

fn prompt_password(username: &str) -> std::io::Result<String> {
    print!("Password for {}: ", username);
    std::io::stdout().flush()?;

    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
