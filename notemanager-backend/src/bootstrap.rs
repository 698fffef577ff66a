//! First-boot administrator provisioning

use crate::config::BootstrapAdmin;
use crate::db::{Database, DbResult};
use crate::models::{CreateUserRequest, User};
use crate::validation;

/// Make sure the configured administrator exists.
///
/// An existing user with that username is left untouched, whatever its flags.
/// Returns the newly created user, if any.
pub fn ensure_admin(db: &Database, admin: &BootstrapAdmin) -> DbResult<Option<User>> {
    if db.get_user_by_username(&admin.username)?.is_some() {
        log::info!("Bootstrap admin {} already exists", admin.username);
        return Ok(None);
    }

    let request = CreateUserRequest {
        username: Some(admin.username.clone()),
        email: Some(admin.email.clone()),
        password: Some(admin.password.clone()),
    };
    let new_user = match validation::new_user(request, true) {
        Ok(new_user) => new_user,
        Err(e) => {
            log::error!("Bootstrap admin credentials rejected: {:?}", e);
            return Ok(None);
        }
    };

    let user = db.create_user(&new_user)?;
    log::info!("Created bootstrap admin {} (id {})", user.username, user.id);
    Ok(Some(user))
}
