use tracing::{info, warn};

use super::{
    dto::{AdditionalInfoFields, SignUpFields},
    repo_types::{NewUser, ProfileUpdate, User},
};
use crate::{
    auth::validators::{
        check_email, check_first_name, check_last_name, check_password, check_phone_number,
        parse_birth_day,
    },
    error::{AppError, Conflict},
    state::AppState,
};

pub async fn sign_up(st: &AppState, f: SignUpFields) -> Result<User, AppError> {
    check_first_name(&f.first_name)?;
    check_last_name(&f.last_name)?;
    check_email(&f.email)?;
    check_password(&f.password)?;
    check_phone_number(&f.phone_number)?;

    if st.users.find_by_email(&f.email).await?.is_some() {
        warn!(email = %f.email, "email already registered");
        return Err(AppError::Conflict(Conflict::Email));
    }
    if st.users.phone_taken(&f.phone_number, None).await? {
        warn!("phone number already registered");
        return Err(AppError::Conflict(Conflict::PhoneNumber));
    }

    let password_hash = st.hasher.hash(&f.password)?;
    let user = st
        .users
        .create(NewUser {
            first_name: f.first_name,
            last_name: f.last_name,
            email: f.email,
            password_hash,
            phone_number: f.phone_number,
        })
        .await?;

    info!(user_id = user.id, "user registered");
    Ok(user)
}

/// Returns a session token and the user's display name.
pub async fn sign_in(st: &AppState, email: &str, password: &str) -> Result<(String, String), AppError> {
    let user = st.users.find_by_email(email).await?.ok_or_else(|| {
        warn!(email, "sign-in for unknown email");
        AppError::UserNotFound
    })?;

    // OAuth-only accounts have no password to match.
    let Some(hash) = user.password_hash.as_deref() else {
        warn!(user_id = user.id, "password sign-in on oauth-only account");
        return Err(AppError::InvalidCredentials);
    };
    if !st.hasher.verify(password, hash)? {
        warn!(user_id = user.id, "sign-in with wrong password");
        return Err(AppError::InvalidCredentials);
    }

    let token = st.jwt.issue(user.id)?;
    info!(user_id = user.id, "user signed in");
    Ok((token, user.display_name()))
}

pub async fn complete_profile(
    st: &AppState,
    user: &User,
    f: AdditionalInfoFields,
) -> Result<User, AppError> {
    check_first_name(&f.first_name)?;
    check_last_name(&f.last_name)?;
    check_phone_number(&f.phone_number)?;
    let birth_day = parse_birth_day(&f.birth_day)?;

    if st.users.phone_taken(&f.phone_number, Some(user.id)).await? {
        warn!(user_id = user.id, "phone number already registered");
        return Err(AppError::Conflict(Conflict::PhoneNumber));
    }

    let updated = st
        .users
        .update_profile(
            user.id,
            ProfileUpdate {
                first_name: f.first_name,
                last_name: f.last_name,
                phone_number: f.phone_number,
                birth_day,
            },
        )
        .await?;

    info!(user_id = user.id, "profile completed");
    Ok(updated)
}

/// Exchanges a provider access token for a local session token. The flag is
/// true when this exchange created the local account.
///
/// Accounts are matched by provider id only. A provider email that already
/// belongs to a password account is `EMAIL_ALREADY_EXIST`; the two are never
/// linked on the provider's word.
pub async fn exchange_oauth(st: &AppState, provider_token: &str) -> Result<(String, bool), AppError> {
    let identity = st.identity.fetch_identity(provider_token).await?;
    let (user, created) = st.users.get_or_create_external(&identity).await?;

    if created {
        info!(user_id = user.id, "user created from external identity");
    } else if let Some(url) = identity.profile_image_url.as_deref() {
        if user.external_profile_img.as_deref() != Some(url) {
            // Best effort: a stale picture is not worth failing the login.
            if let Err(e) = st.users.set_external_profile_img(user.id, url).await {
                warn!(user_id = user.id, error = %e, "profile image resync failed");
            }
        }
    }

    let token = st.jwt.issue(user.id)?;
    Ok((token, created))
}

pub async fn is_host(st: &AppState, user: &User) -> Result<bool, AppError> {
    Ok(st.hosts.find_by_user(user.id).await?.is_some())
}
