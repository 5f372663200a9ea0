//! Response helpers
//!
//! Every failure body is `{"message": ...}`; messages come from the typed
//! errors and never carry credentials.

use appforge_generation::GenerationError;
use serde::Serialize;
use std::convert::Infallible;
use warp::http::header::RETRY_AFTER;
use warp::http::{HeaderValue, StatusCode};
use warp::reply::Response;
use warp::{Rejection, Reply};

#[derive(Serialize)]
struct MessageBody<'a> {
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'a str>,
}

pub(crate) fn json<T: Serialize>(status: StatusCode, body: &T) -> Response {
    warp::reply::with_status(warp::reply::json(body), status).into_response()
}

pub(crate) fn message(status: StatusCode, message: &str) -> Response {
    json(status, &MessageBody { message, reason: None })
}

pub(crate) fn message_with_reason(status: StatusCode, message: &str, reason: &str) -> Response {
    json(
        status,
        &MessageBody {
            message,
            reason: Some(reason),
        },
    )
}

pub(crate) fn generation_error(err: &GenerationError) -> Response {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut response = message(status, &err.user_message());
    if let Some(after) = err.retry_after() {
        response
            .headers_mut()
            .insert(RETRY_AFTER, HeaderValue::from(after.as_secs()));
    }
    response
}

/// Map warp rejections onto the same `{message}` body
pub(crate) async fn recover(err: Rejection) -> Result<Response, Infallible> {
    if err.is_not_found() {
        return Ok(message(StatusCode::NOT_FOUND, "Not found"));
    }
    if let Some(body) = err.find::<warp::filters::body::BodyDeserializeError>() {
        return Ok(message_with_reason(
            StatusCode::BAD_REQUEST,
            "Invalid request body",
            &body.to_string(),
        ));
    }
    if err.find::<warp::reject::InvalidQuery>().is_some() {
        return Ok(message(StatusCode::BAD_REQUEST, "Invalid query string"));
    }
    if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        return Ok(message(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large"));
    }
    if err.find::<warp::reject::UnsupportedMediaType>().is_some() {
        return Ok(message(StatusCode::UNSUPPORTED_MEDIA_TYPE, "Expected a JSON body"));
    }
    if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        return Ok(message(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed"));
    }

    tracing::error!(rejection = ?err, "Unhandled rejection");
    Ok(message(
        StatusCode::INTERNAL_SERVER_ERROR,
        "An unexpected error occurred. Please try again.",
    ))
}
