use actix_web::{cookie::Cookie, http::header, HttpResponse};
use serde_json::json;

pub struct ResponseBuilder;

impl ResponseBuilder {
    /// 302 to `location`, attaching every cookie the request's session jar queued
    #[must_use]
    pub fn redirect(location: &str, cookies: Vec<Cookie<'static>>) -> HttpResponse {
        let mut builder = HttpResponse::Found();
        for cookie in cookies {
            builder.cookie(cookie);
        }
        builder
            .insert_header((header::LOCATION, location))
            .finish()
    }

    /// 302 to `location` with `message` as its `error` query parameter
    #[must_use]
    pub fn error_redirect(
        location: &str,
        message: &str,
        cookies: Vec<Cookie<'static>>,
    ) -> HttpResponse {
        Self::redirect(&with_error_param(location, message), cookies)
    }

    /// `{"error": message}` with status 200, the shape callback links answer a broken request with
    #[must_use]
    pub fn json_error(message: &str, cookies: Vec<Cookie<'static>>) -> HttpResponse {
        let mut builder = HttpResponse::Ok();
        for cookie in cookies {
            builder.cookie(cookie);
        }
        builder.json(json!({ "error": message }))
    }

    /// JSON body with the jar's cookies attached
    #[must_use]
    pub fn json_with_cookies<T: serde::Serialize>(
        body: &T,
        cookies: Vec<Cookie<'static>>,
    ) -> HttpResponse {
        let mut builder = HttpResponse::Ok();
        for cookie in cookies {
            builder.cookie(cookie);
        }
        builder.json(body)
    }

    /// Empty 404, used when a route belongs to a strategy this deployment does not run
    #[must_use]
    pub fn not_found() -> HttpResponse {
        HttpResponse::NotFound().finish()
    }
}

/// Append `error=<message>` to a path, keeping any query it already has
#[must_use]
pub fn with_error_param(location: &str, message: &str) -> String {
    let separator = if location.contains('?') { '&' } else { '?' };
    format!(
        "{location}{separator}error={}",
        urlencoding::encode(message)
    )
}
