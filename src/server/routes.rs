use axum::{
    extract::{Form, Query, Request, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tower::ServiceExt;
use tower_http::services::ServeFile;
use crate::server::{render, AppState};
use crate::{export, Error};
use std::path::Path;
use std::sync::Arc;

#[derive(Deserialize)]
pub struct UrlParams {
    pub url: Option<String>,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, error: impl Into<String>) -> ApiError {
    (status, Json(ErrorResponse { error: error.into() }))
}

/// Caller mistakes surface as 400, everything else as 500
fn store_error(e: Error) -> ApiError {
    let status = match e {
        Error::NotFound(_)
        | Error::EmptyLabels
        | Error::InvalidLabel(_)
        | Error::InvalidIdentifier(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        tracing::error!("Request failed: {}", e);
    }
    api_error(status, e.to_string())
}

/// Redirect to the next unlabelled record, or to the bare page if none is left
fn redirect_to_next(state: &AppState) -> Result<Redirect, ApiError> {
    let next = state.store.next_unlabelled().map_err(store_error)?;
    Ok(match next {
        Some(rec) => Redirect::to(&render::record_location(&rec.identifier)),
        None => Redirect::to("/"),
    })
}

pub async fn index(
    State(state): State<Arc<AppState>>,
    Query(params): Query<UrlParams>,
) -> Result<Response, ApiError> {
    let featured = match params.url.filter(|u| !u.is_empty()) {
        Some(url) => {
            let rec = state.store.get(&url).map_err(store_error)?;
            render::item(&state.settings, &rec)
        }
        None => {
            // Redirect so the address bar names the item and it can be revisited
            if let Some(rec) = state.store.next_unlabelled().map_err(store_error)? {
                return Ok(Redirect::to(&render::record_location(&rec.identifier)).into_response());
            }
            render::NO_UNLABELLED.to_string()
        }
    };

    let status = state.store.status().map_err(store_error)?;
    Ok(Html(render::page(&featured, &status)).into_response())
}

/// Form fields: `url` once, `label` one or more times
pub async fn update(
    State(state): State<Arc<AppState>>,
    Form(fields): Form<Vec<(String, String)>>,
) -> Result<Redirect, ApiError> {
    let mut url = None;
    let mut labels = Vec::new();
    for (key, value) in fields {
        match key.as_str() {
            "url" => url = Some(value),
            "label" => labels.push(value),
            _ => {}
        }
    }

    let url = url
        .filter(|u| !u.is_empty())
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "Missing url"))?;

    let count = state.store.update_label(&url, &labels).map_err(store_error)?;
    if count == 0 {
        return Err(api_error(StatusCode::BAD_REQUEST, "Failed... No records updated"));
    }

    redirect_to_next(&state)
}

/// Stream a local file so the browser can display path-based items
pub async fn proxy(Query(params): Query<UrlParams>, request: Request) -> Result<Response, ApiError> {
    let path = match params.url {
        Some(url) if Path::new(&url).is_file() => url,
        other => {
            let url = other.unwrap_or_default();
            return Err(api_error(StatusCode::BAD_REQUEST, format!("File {url} not found")));
        }
    };

    let response = ServeFile::new(&path)
        .oneshot(request)
        .await
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(response.into_response())
}

pub async fn settings(State(state): State<Arc<AppState>>) -> Json<crate::Settings> {
    Json(state.settings.clone())
}

pub async fn status(State(state): State<Arc<AppState>>) -> Result<Json<crate::Status>, ApiError> {
    let status = state.store.status().map_err(store_error)?;
    Ok(Json(status))
}

pub async fn classifications(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let body = export::to_csv_string(&state.store).map_err(store_error)?;
    Ok(([(header::CONTENT_TYPE, export::CONTENT_TYPE)], body).into_response())
}
