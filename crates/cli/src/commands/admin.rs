//! Admin user management commands.
//!
//! # Usage
//!
//! ```bash
//! # Create a new admin user
//! chapter-cli admin create -e admin@chapter.edu -n "Admin Name" -r super_admin -p '...'
//!
//! # Deactivate an admin (existing sessions end on their next request)
//! chapter-cli admin deactivate -e admin@chapter.edu
//! ```

use secrecy::SecretString;

use chapter_admin::db::AdminUserRepository;
use chapter_core::{AdminRole, Email};

use super::{CommandError, connect};

/// Create a new admin user.
///
/// The password is hashed by the database; it never leaves this process in
/// any other form.
pub async fn create_user(
    email: &str,
    name: &str,
    role: &str,
    password: String,
) -> Result<(), CommandError> {
    let role: AdminRole = role.parse().map_err(CommandError::InvalidRole)?;
    let email = Email::parse(email)?;
    let password = SecretString::from(password);

    let pool = connect().await?;

    tracing::info!("Creating admin user: {} ({})", email, role);
    let user = AdminUserRepository::new(&pool)
        .create(&email, name, role, &password)
        .await?;

    tracing::info!(
        "Admin user created successfully! ID: {}, Email: {}, Role: {}",
        user.id,
        user.email,
        user.role
    );
    Ok(())
}

/// Deactivate an admin user.
pub async fn deactivate(email: &str) -> Result<(), CommandError> {
    let email = Email::parse(email)?;
    let pool = connect().await?;

    AdminUserRepository::new(&pool)
        .set_active(&email, false)
        .await?;

    tracing::info!("Admin user deactivated: {}", email);
    Ok(())
}
