use ensemble_core::{Email, User, UserId, UserName};

use crate::server::{
    core::{now_unix, AppState},
    errors::{Entity, GroupError},
};

/// Adds a user to the directory. Emails are unique after normalization.
///
/// # Errors
/// Returns [`GroupError::InvalidRequest`] for a malformed name or email and
/// [`GroupError::AlreadyExists`] when the email is taken.
pub async fn register_user(
    state: &AppState,
    name: String,
    email: String,
) -> Result<User, GroupError> {
    let name = UserName::try_from(name)?;
    let email = Email::try_from(email)?;

    let mut directory = state.directory.write().await;
    if directory.user_emails.contains_key(&email) {
        return Err(GroupError::AlreadyExists(Entity::User));
    }
    let user = User {
        id: UserId::new(),
        name,
        email: email.clone(),
        create_time: now_unix(),
    };
    directory.user_emails.insert(email, user.id);
    directory.users.insert(user.id, user.clone());

    tracing::info!(event = "user.registered", user_id = %user.id);
    Ok(user)
}

/// # Errors
/// Returns [`GroupError::NotFound`] for an unknown id.
pub async fn user(state: &AppState, user_id: UserId) -> Result<User, GroupError> {
    let directory = state.directory.read().await;
    directory.user_record(user_id).cloned()
}

/// # Errors
/// Returns [`GroupError::NotFound`] when no user has this email.
pub async fn user_by_email(state: &AppState, email: &str) -> Result<User, GroupError> {
    let email = Email::try_from(String::from(email))?;
    let directory = state.directory.read().await;
    let user_id = directory
        .user_emails
        .get(&email)
        .ok_or(GroupError::NotFound(Entity::User))?;
    directory.user_record(*user_id).cloned()
}
