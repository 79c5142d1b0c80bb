use std::any::Any;
use std::future::Future;
use std::io;

use axum::Router;
use axum::http::{HeaderValue, header};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::error::{ApiError, Error};
use crate::handlers::{service, subscription};
use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    let expose_internal = state.expose_internal();

    Router::new()
        .route("/", get(service::info))
        .route("/health", get(service::health))
        .route("/setActivity", post(subscription::set_activity))
        .route(
            "/setSubscriptionDiscount",
            post(subscription::set_subscription_discount),
        )
        .route(
            "/setSubscriptionPaymentDate",
            post(subscription::set_subscription_payment_date),
        )
        .fallback(service::not_found)
        .layer(CatchPanicLayer::custom(
            move |panic: Box<dyn Any + Send + 'static>| {
                let message = panic
                    .downcast_ref::<String>()
                    .cloned()
                    .or_else(|| panic.downcast_ref::<&str>().map(|s| (*s).to_owned()))
                    .unwrap_or_else(|| String::from("handler panicked"));
                ApiError::new("Unhandled error", Error::Internal(message), expose_internal)
                    .into_response()
            },
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("SAMEORIGIN"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::REFERRER_POLICY,
            HeaderValue::from_static("no-referrer"),
        ))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Resolves once `signal` fires.
///
/// If the signal handler could not be installed this never resolves, so the
/// server keeps running instead of shutting down immediately.
pub async fn shutdown_on<F>(signal: F)
where
    F: Future<Output = io::Result<()>>,
{
    if let Err(error) = signal.await {
        tracing::error!(%error, "failed to install shutdown signal handler, graceful shutdown disabled");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
