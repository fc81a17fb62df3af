//! Chapter CLI - Database migrations and admin management tools.
//!
//! # Usage
//!
//! ```bash
//! # Run admin database migrations
//! chapter-cli migrate
//!
//! # Create an admin user
//! chapter-cli admin create -e lead@chapter.edu -n "Events Lead" -r team_member -p '...'
//!
//! # Teams
//! chapter-cli team create --name Events --slug events --color '#e4572e'
//! chapter-cli team add-member --team events --email lead@chapter.edu --role lead
//!
//! # Local session, evaluated exactly as the admin panel does
//! chapter-cli login -e lead@chapter.edu -p '...'
//! chapter-cli whoami
//! chapter-cli can /admin/events/new
//! chapter-cli logout
//!
//! # Validate a permission policy
//! chapter-cli policy check --file permissions.yaml
//! ```
//!
//! # Commands
//!
//! - `migrate` - Run database migrations
//! - `admin` - Create and deactivate admin users
//! - `team` - Manage teams and memberships
//! - `login` / `logout` / `whoami` / `can` - Local admin session
//! - `policy check` - Validate a permission policy file

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "chapter-cli")]
#[command(author, version, about = "Chapter admin CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run admin database migrations
    Migrate,
    /// Manage admin users
    Admin {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Manage teams and memberships
    Team {
        #[command(subcommand)]
        action: TeamAction,
    },
    /// Sign in and store the session locally
    Login {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// Admin password
        #[arg(short, long)]
        password: String,
    },
    /// Clear the local session
    Logout,
    /// Show the signed-in admin and their teams
    Whoami,
    /// Check whether the signed-in admin may open an admin page
    Can {
        /// Page path, e.g. /admin/events/new
        path: String,
    },
    /// Inspect permission policies
    Policy {
        #[command(subcommand)]
        action: PolicyAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// Create a new admin user
    Create {
        /// Admin email address
        #[arg(short, long)]
        email: String,

        /// Admin display name
        #[arg(short, long)]
        name: String,

        /// Admin role (`super_admin`, `admin`, `team_member`)
        #[arg(short, long, default_value = "team_member")]
        role: String,

        /// Initial password (hashed by the database)
        #[arg(short, long)]
        password: String,
    },
    /// Deactivate an admin user
    Deactivate {
        /// Admin email address
        #[arg(short, long)]
        email: String,
    },
}

#[derive(Subcommand)]
enum TeamAction {
    /// Create a team
    Create {
        #[arg(long)]
        name: String,

        /// URL-safe identifier, e.g. `public-relations`
        #[arg(long)]
        slug: String,

        #[arg(long, default_value = "#6e6e73")]
        color: String,
    },
    /// List teams
    List,
    /// Delete a team and its memberships
    Delete {
        #[arg(long)]
        slug: String,
    },
    /// Add an admin to a team, or change their role
    AddMember {
        /// Team slug
        #[arg(long)]
        team: String,

        #[arg(long)]
        email: String,

        /// In-team role (`lead`, `co_lead`, `member`)
        #[arg(long, default_value = "member")]
        role: String,
    },
    /// Remove an admin from a team
    RemoveMember {
        /// Team slug
        #[arg(long)]
        team: String,

        #[arg(long)]
        email: String,
    },
}

#[derive(Subcommand)]
enum PolicyAction {
    /// Validate a policy file (the built-in policy if omitted)
    Check {
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Admin { action } => match action {
            AdminAction::Create {
                email,
                name,
                role,
                password,
            } => {
                commands::admin::create_user(&email, &name, &role, password).await?;
            }
            AdminAction::Deactivate { email } => commands::admin::deactivate(&email).await?,
        },
        Commands::Team { action } => match action {
            TeamAction::Create { name, slug, color } => {
                commands::team::create(&name, &slug, &color).await?;
            }
            TeamAction::List => commands::team::list().await?,
            TeamAction::Delete { slug } => commands::team::delete(&slug).await?,
            TeamAction::AddMember { team, email, role } => {
                commands::team::add_member(&team, &email, &role).await?;
            }
            TeamAction::RemoveMember { team, email } => {
                commands::team::remove_member(&team, &email).await?;
            }
        },
        Commands::Login { email, password } => commands::session::login(&email, password).await?,
        Commands::Logout => commands::session::logout().await?,
        Commands::Whoami => commands::session::whoami().await?,
        Commands::Can { path } => commands::session::can(&path).await?,
        Commands::Policy { action } => match action {
            PolicyAction::Check { file } => commands::policy::check(file.as_deref())?,
        },
    }
    Ok(())
}
