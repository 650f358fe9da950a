//! Responses carrying a screen's resynced list.
//!
//! A list that could not be reloaded is never sent as if it were current: a
//! failed read answers 502 with the alert, and a write whose resync failed
//! answers 204 without a body. Both carry [`STALE_LIST_HEADER`] so the client
//! keeps the list it already shows.

use axum::{
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::error::AppError;

pub const STALE_LIST_HEADER: &str = "x-list-stale";

pub struct Listing<T> {
    status: StatusCode,
    items: Vec<T>,
    fresh: bool,
    load_alert: Option<&'static str>,
}

impl<T> Listing<T> {
    /// Plain list request.
    pub fn read(items: Vec<T>, fresh: bool, load_alert: &'static str) -> Self {
        Self {
            status: StatusCode::OK,
            items,
            fresh,
            load_alert: Some(load_alert),
        }
    }

    /// List reloaded after a successful write.
    pub fn written(status: StatusCode, items: Vec<T>, fresh: bool) -> Self {
        Self {
            status,
            items,
            fresh,
            load_alert: None,
        }
    }
}

impl<T: Serialize> IntoResponse for Listing<T> {
    fn into_response(self) -> Response {
        if self.fresh {
            return (self.status, Json(self.items)).into_response();
        }

        let stale = [(
            HeaderName::from_static(STALE_LIST_HEADER),
            HeaderValue::from_static("true"),
        )];
        match self.load_alert {
            Some(alert) => (stale, AppError::bad_gateway(alert)).into_response(),
            None => (StatusCode::NO_CONTENT, stale).into_response(),
        }
    }
}
