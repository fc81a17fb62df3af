//! Permission policy commands.

use std::path::Path;

use chapter_admin::services::PermissionPolicy;

use super::CommandError;

/// Validate a policy file, or the built-in policy when `file` is `None`.
pub fn check(file: Option<&Path>) -> Result<(), CommandError> {
    let policy = match file {
        Some(path) => PermissionPolicy::load(path)?,
        None => PermissionPolicy::builtin()?,
    };

    let source = file.map_or_else(|| "built-in policy".to_string(), |p| p.display().to_string());

    #[allow(clippy::print_stdout)]
    {
        println!("{source}: ok ({} routes)", policy.routes().len());
        for route in policy.routes() {
            println!("  {:<48} {}/{}", route.pattern(), route.resource, route.action);
        }
    }
    Ok(())
}
