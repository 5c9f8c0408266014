//! Custom Axum extractors

use std::collections::HashMap;
use std::convert::Infallible;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequest, FromRequestParts, Request};
use axum::http::header::{CONTENT_TYPE, USER_AGENT};
use axum::http::request::Parts;
use axum::{Form, Json};
use birthorder_core::RequestContext;
use serde_json::{Map, Value};

use super::error::ApiError;

/// Client address and user agent recorded alongside a submission.
///
/// The address comes from the socket peer only; forwarding headers are not
/// trusted.
pub struct ClientContext(pub RequestContext);

impl<S> FromRequestParts<S> for ClientContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ip_address = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string());

        let user_agent = parts
            .headers
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        Ok(Self(RequestContext {
            ip_address,
            user_agent,
        }))
    }
}

/// Flat submission body, JSON object or URL-encoded form.
pub struct SubmissionBody(pub Map<String, Value>);

fn is_form(req: &Request) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"))
}

impl<S> FromRequest<S> for SubmissionBody
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if is_form(&req) {
            let Form(fields): Form<HashMap<String, String>> = Form::from_request(req, state)
                .await
                .map_err(|e| ApiError::BadRequest {
                    message: e.body_text(),
                })?;
            return Ok(Self(
                fields.into_iter().map(|(k, v)| (k, Value::String(v))).collect(),
            ));
        }

        let Json(value): Json<Value> = Json::from_request(req, state)
            .await
            .map_err(|e| ApiError::BadRequest {
                message: e.body_text(),
            })?;

        match value {
            Value::Object(map) => Ok(Self(map)),
            _ => Err(ApiError::BadRequest {
                message: "Request body must be a JSON object".to_string(),
            }),
        }
    }
}
