//! Signup, login, logout and account pages

use crate::error::AppError;
use crate::extractors::RequestContext;
use crate::forms::{LoginForm, PasswordUpdateForm, PostForm, SignupForm};
use crate::models::ModelError;
use crate::session::keys;
use crate::state::AppState;
use crate::template::{render, AccountPage, LoginPage, PasswordPage, SignupPage};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};

/// Where a successful login lands when no page was remembered
pub const DEFAULT_AFTER_LOGIN: &str = "/snippet/create";

/// `GET /user/signup`
pub async fn signup_form(ctx: RequestContext) -> Result<Response, AppError> {
    Ok(render(
        StatusCode::OK,
        &SignupPage {
            data: ctx.template_data()?,
            form: SignupForm::default(),
        },
    ))
}

/// `POST /user/signup`
pub async fn signup(
    State(state): State<AppState>,
    ctx: RequestContext,
    PostForm(mut form): PostForm<SignupForm>,
) -> Result<Response, AppError> {
    if form.validate() {
        match state
            .users()
            .insert(&form.name, &form.email, &form.password)
            .await
        {
            Ok(()) => {
                ctx.session
                    .put(keys::FLASH, "Your signup was successful. Please log in.")?;
                return Ok(Redirect::to("/user/login").into_response());
            }
            Err(ModelError::DuplicateEmail) => {
                form.validator
                    .add_field_error("email", "Email address is already in use");
            }
            Err(err) => return Err(err.into()),
        }
    }

    Ok(render(
        StatusCode::UNPROCESSABLE_ENTITY,
        &SignupPage {
            data: ctx.template_data()?,
            form,
        },
    ))
}

/// `GET /user/login`
pub async fn login_form(ctx: RequestContext) -> Result<Response, AppError> {
    Ok(render(
        StatusCode::OK,
        &LoginPage {
            data: ctx.template_data()?,
            form: LoginForm::default(),
        },
    ))
}

/// `POST /user/login`
///
/// Unknown addresses and wrong passwords get the same message. On success
/// the session token is renewed before the user id is stored.
pub async fn login(
    State(state): State<AppState>,
    ctx: RequestContext,
    PostForm(mut form): PostForm<LoginForm>,
) -> Result<Response, AppError> {
    if form.validate() {
        match state.users().authenticate(&form.email, &form.password).await {
            Ok(user_id) => {
                ctx.session.renew_token().await?;
                ctx.session.put(keys::AUTHENTICATED_USER_ID, user_id)?;
                tracing::info!(user_id, "user logged in");

                let target = ctx
                    .session
                    .pop_string(keys::REDIRECT_PATH_AFTER_LOGIN)
                    .filter(|path| is_local_path(path))
                    .unwrap_or_else(|| DEFAULT_AFTER_LOGIN.to_string());
                return Ok(Redirect::to(&target).into_response());
            }
            Err(ModelError::InvalidCredentials) => {
                form.validator
                    .add_non_field_error("Email or password is incorrect");
            }
            Err(err) => return Err(err.into()),
        }
    }

    Ok(render(
        StatusCode::UNPROCESSABLE_ENTITY,
        &LoginPage {
            data: ctx.template_data()?,
            form,
        },
    ))
}

/// `POST /user/logout`
pub async fn logout(ctx: RequestContext) -> Result<Response, AppError> {
    ctx.session.renew_token().await?;
    ctx.session.remove(keys::AUTHENTICATED_USER_ID);
    ctx.session
        .put(keys::FLASH, "You've been logged out successfully!")?;
    tracing::info!(user_id = ctx.identity().map(|i| i.id), "user logged out");

    Ok(Redirect::to("/").into_response())
}

/// `GET /account/view`
pub async fn account_view(
    State(state): State<AppState>,
    ctx: RequestContext,
) -> Result<Response, AppError> {
    let Some(identity) = ctx.identity() else {
        return Ok(Redirect::to("/user/login").into_response());
    };

    let user = match state.users().get(identity.id).await {
        Ok(user) => user,
        Err(ModelError::NoRecord) => return Ok(Redirect::to("/user/login").into_response()),
        Err(err) => return Err(err.into()),
    };

    Ok(render(
        StatusCode::OK,
        &AccountPage {
            data: ctx.template_data()?,
            user,
        },
    ))
}

/// `GET /account/password/update`
pub async fn password_update_form(ctx: RequestContext) -> Result<Response, AppError> {
    Ok(render(
        StatusCode::OK,
        &PasswordPage {
            data: ctx.template_data()?,
            form: PasswordUpdateForm::default(),
        },
    ))
}

/// `POST /account/password/update`
pub async fn password_update(
    State(state): State<AppState>,
    ctx: RequestContext,
    PostForm(mut form): PostForm<PasswordUpdateForm>,
) -> Result<Response, AppError> {
    let Some(user_id) = ctx.identity().map(|identity| identity.id) else {
        return Ok(Redirect::to("/user/login").into_response());
    };

    if form.validate() {
        match state
            .users()
            .password_update(user_id, &form.current_password, &form.new_password)
            .await
        {
            Ok(()) => {
                ctx.session
                    .put(keys::FLASH, "Your password has been updated!")?;
                return Ok(Redirect::to("/account/view").into_response());
            }
            Err(ModelError::InvalidCredentials) => {
                form.validator
                    .add_field_error("currentPassword", "Current password is incorrect");
            }
            Err(ModelError::SamePassword) => {
                form.validator.add_field_error(
                    "newPassword",
                    "New password must differ from the current one",
                );
            }
            Err(err) => return Err(err.into()),
        }
    }

    Ok(render(
        StatusCode::UNPROCESSABLE_ENTITY,
        &PasswordPage {
            data: ctx.template_data()?,
            form,
        },
    ))
}

/// A same-site absolute path; rejects `//host` and `/\host` forms
fn is_local_path(path: &str) -> bool {
    path.starts_with('/') && !path.starts_with("//") && !path.starts_with("/\\")
}
