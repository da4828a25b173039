use actix_web::http::StatusCode;
use actix_web::{HttpResponse, HttpResponseBuilder};
use serde::Serialize;

/// Success envelope shared by every `/api/v1` route.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub status_code: u16,
    pub data: T,
    pub message: String,
    pub success: bool,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(status: StatusCode, data: T, message: impl Into<String>) -> Self {
        Self {
            status_code: status.as_u16(),
            data,
            message: message.into(),
            success: status.as_u16() < 400,
        }
    }

    pub fn ok(data: T, message: impl Into<String>) -> HttpResponse {
        Self::send(HttpResponse::Ok(), StatusCode::OK, data, message)
    }

    pub fn created(data: T, message: impl Into<String>) -> HttpResponse {
        Self::send(HttpResponse::Created(), StatusCode::CREATED, data, message)
    }

    /// For responses that also carry cookies or headers.
    pub fn send(
        mut builder: HttpResponseBuilder,
        status: StatusCode,
        data: T,
        message: impl Into<String>,
    ) -> HttpResponse {
        builder.json(Self::new(status, data, message))
    }
}
