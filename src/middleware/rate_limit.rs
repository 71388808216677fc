use std::rc::Rc;

use actix_web::body::EitherBody;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::HeaderMap;
use actix_web::{web, Error};
use futures_util::future::{ok, LocalBoxFuture, Ready};
use log::{debug, error};

use crate::config::RateLimitConfig;
use crate::errors::AppError;
use crate::services::{RateDecision, RateLimiter};

/// Rejects requests whose identity has exhausted its window. Rejections are
/// rendered as responses here so outer middleware still sees the status.
///
/// The limiter is looked up from app data registered by
/// `services::register`, so the middleware itself carries no state.
#[derive(Clone, Copy, Default)]
pub struct RateLimit;

/// Resolves the rate-limiting identity: the configured client address
/// header, else the fallback constant.
pub fn identity_from_headers(headers: &HeaderMap, config: &RateLimitConfig) -> String {
    headers
        .get(config.identity_header.as_str())
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
        .unwrap_or_else(|| config.fallback_identity.clone())
}

impl<S, B> Transform<S, ServiceRequest> for RateLimit
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = RateLimitMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(RateLimitMiddleware {
            service: Rc::new(service),
        })
    }
}

pub struct RateLimitMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for RateLimitMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();

        Box::pin(async move {
            let Some(limiter) = req.app_data::<web::Data<RateLimiter>>().cloned() else {
                error!("Rate limiter is not registered");
                let err = AppError::Internal("Rate limiter unavailable".to_string());
                return Ok(req.error_response(err).map_into_right_body());
            };

            let identity = identity_from_headers(req.headers(), limiter.config());

            let rejection = match limiter.check_and_record(&identity).await {
                Ok(RateDecision::Admit { .. }) => {
                    return service
                        .call(req)
                        .await
                        .map(ServiceResponse::map_into_left_body);
                }
                Ok(RateDecision::Reject {
                    retry_after_seconds,
                }) => {
                    debug!(
                        "Rate limited {}: retry in {}s",
                        identity, retry_after_seconds
                    );
                    AppError::RateLimited {
                        retry_after: retry_after_seconds,
                    }
                }
                Err(e) => AppError::from(e),
            };

            Ok(req.error_response(rejection).map_into_right_body())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn test_identity_from_header() {
        let config = RateLimitConfig::default();
        let req = TestRequest::default()
            .insert_header(("cf-connecting-ip", " 1.2.3.4 "))
            .to_http_request();
        assert_eq!(identity_from_headers(req.headers(), &config), "1.2.3.4");
    }

    #[test]
    fn test_identity_falls_back_when_missing() {
        let config = RateLimitConfig::default();
        let req = TestRequest::default().to_http_request();
        assert_eq!(identity_from_headers(req.headers(), &config), "global");

        let req = TestRequest::default()
            .insert_header(("cf-connecting-ip", ""))
            .to_http_request();
        assert_eq!(identity_from_headers(req.headers(), &config), "global");
    }

    #[test]
    fn test_identity_header_is_configurable() {
        let config = RateLimitConfig {
            identity_header: "x-forwarded-for".to_string(),
            ..Default::default()
        };
        let req = TestRequest::default()
            .insert_header(("x-forwarded-for", "10.0.0.1"))
            .insert_header(("cf-connecting-ip", "1.2.3.4"))
            .to_http_request();
        assert_eq!(identity_from_headers(req.headers(), &config), "10.0.0.1");
    }
}
