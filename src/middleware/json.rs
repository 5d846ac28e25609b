// src/middleware/json.rs

use axum::{
    extract::{rejection::JsonRejection, FromRef, FromRequest, Request},
    http::StatusCode,
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::{common::error::ApiError, config::AppState, middleware::i18n::Locale};

/// `Json<T>` com a rejeição no envelope padrão e traduzida.
/// O texto do serde vai em `details.body`.
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let (parts, body) = req.into_parts();
        let locale = Locale::from_parts(&parts);
        let req = Request::from_parts(parts, body);

        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(body_error(&rejection, &locale, &AppState::from_ref(state))),
        }
    }
}

fn body_error(rejection: &JsonRejection, locale: &Locale, app_state: &AppState) -> ApiError {
    tracing::debug!("Corpo rejeitado: {}", rejection.body_text());

    // 415 (sem Content-Type JSON) segue como está; o resto é erro de entrada
    let status = match rejection {
        JsonRejection::MissingJsonContentType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        _ => StatusCode::BAD_REQUEST,
    };
    ApiError {
        status,
        error: app_state.i18n_store.translate(&locale.0, "error.invalid_body", &[]),
        details: Some(json!({ "body": [rejection.body_text()] })),
    }
}
