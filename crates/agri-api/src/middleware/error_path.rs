//! Fills `path` into error bodies.
//!
//! Handlers and extractors produce [`ErrorResponse`]s without knowing the
//! request URI. The response carries a copy of the body in its extensions;
//! this middleware re-renders it with the path of the request that failed.

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::response::ErrorResponse;

pub async fn error_path_middleware(request: Request, next: Next) -> Response {
    let path = request.uri().path().to_string();
    let mut response = next.run(request).await;

    match response.extensions_mut().remove::<ErrorResponse>() {
        Some(body) if body.path.is_none() => {
            let mut rendered = body.with_path(path).into_response();
            for (name, value) in response.headers() {
                if !rendered.headers().contains_key(name) {
                    rendered.headers_mut().insert(name.clone(), value.clone());
                }
            }
            rendered
        }
        Some(body) => {
            response.extensions_mut().insert(body);
            response
        }
        None => response,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use axum::middleware::from_fn;
    use axum::routing::get;
    use axum::Router;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route(
                "/fails",
                get(|| async { ErrorResponse::new(StatusCode::CONFLICT, "MSG9", "taken") }),
            )
            .route("/ok", get(|| async { "fine" }))
            .layer(from_fn(error_path_middleware))
    }

    #[tokio::test]
    async fn error_body_gets_request_path() {
        let resp = app()
            .oneshot(Request::get("/fails").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["path"], "/fails");
        assert_eq!(json["code"], "MSG9");
    }

    #[tokio::test]
    async fn success_passes_through() {
        let resp = app()
            .oneshot(Request::get("/ok").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"fine");
    }
}
