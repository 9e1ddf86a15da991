//! Request extractors.
//!
//! Handlers never look at headers or extensions directly; they receive a
//! [`RequestContext`] built here.

use agora_common::{AppError, IdGenerator};
use agora_core::{RequestContext, i18n::DEFAULT_LANGUAGE};
use agora_db::entities::user;
use axum::{
    Json,
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::{HeaderMap, header::ACCEPT_LANGUAGE, request::Parts},
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::middleware::AppState;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// First supported language of `Accept-Language`, e.g. `zh-CN` -> `zh_CN`.
fn header_language(state: &AppState, headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(ACCEPT_LANGUAGE)?.to_str().ok()?;
    raw.split(',')
        .filter_map(|part| part.split(';').next())
        .map(|tag| tag.trim().replace('-', "_"))
        .find(|tag| state.translator.supports(tag))
}

fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map_or_else(|| IdGenerator::new().generate_request_id(), ToString::to_string)
}

/// Build the caller context from what the auth middleware left behind.
fn context(state: &AppState, parts: &Parts) -> RequestContext {
    let request_id = request_id(&parts.headers);
    let ctx = parts.extensions.get::<user::Model>().map_or_else(
        || RequestContext::anonymous(DEFAULT_LANGUAGE, request_id.clone()),
        |user| RequestContext::for_user(user, request_id.clone()),
    );

    match header_language(state, &parts.headers) {
        Some(language) => ctx.with_language(language),
        None if state.translator.supports(&ctx.language) => ctx,
        None => ctx.with_language(DEFAULT_LANGUAGE),
    }
}

/// Any caller, signed in or not.
#[derive(Debug, Clone)]
pub struct Caller(pub RequestContext);

impl FromRequestParts<AppState> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(Self(context(state, parts)))
    }
}

/// A signed-in caller.
#[derive(Debug, Clone)]
pub struct AuthCaller(pub RequestContext);

impl FromRequestParts<AppState> for AuthCaller {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let ctx = context(state, parts);
        ctx.require_user()?;
        Ok(Self(ctx))
    }
}

/// A signed-in admin or moderator.
#[derive(Debug, Clone)]
pub struct AdminCaller(pub RequestContext);

impl FromRequestParts<AppState> for AdminCaller {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let AuthCaller(ctx) = AuthCaller::from_request_parts(parts, state).await?;
        if !ctx.is_staff() {
            return Err(AppError::Forbidden("admin only".to_string()));
        }
        Ok(Self(ctx))
    }
}

/// JSON body checked with the shared [`agora_core::Validator`].
///
/// Field messages are translated into the request language.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<T> FromRequest<AppState> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + Send,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let (parts, body) = req.into_parts();
        let language = context(state, &parts).language;

        let Json(value) = Json::<T>::from_request(Request::from_parts(parts, body), state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        state.validator.check(&value, &language)?;
        Ok(Self(value))
    }
}

/// Query string parameters; malformed input is a `BadRequest` envelope.
#[derive(Debug, Clone)]
pub struct Params<T>(pub T);

impl<T, S> FromRequestParts<S> for Params<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        Ok(Self(value))
    }
}
