use crate::domain::account::AccountKind;
use crate::infrastructure::security::TokenKeys;
use actix_web::{
    Error, HttpMessage,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::header::{AUTHORIZATION, HeaderName, HeaderValue},
};
use futures::future::LocalBoxFuture;
use std::{
    future::{Ready, ready},
    rc::Rc,
    time::Instant,
};
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

/// Caller identity recovered from a verified bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub id: String,
    pub name: String,
    pub kind: AccountKind,
}

/// Why a presented bearer token was not accepted. Stored in the request
/// extensions so protected handlers can report it.
#[derive(Debug, Clone)]
pub struct AuthRejection(pub String);

const REQUEST_ID_HEADER: &str = "x-request-id";
const RESPONSE_TIME_HEADER: &str = "x-response-time";

/// Tags every request with an id and reports how long it took.
///
/// A caller-supplied `x-request-id` is kept when it is a short printable
/// token, otherwise a fresh UUID is used. The handler runs inside a span
/// carrying the id so every log line of the request can be correlated.
/// Errors from inner services are rendered here so they get the headers too.
pub struct RequestTracing;

impl<S, B> Transform<S, ServiceRequest> for RequestTracing
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = RequestTracingService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(RequestTracingService { service }))
    }
}

pub struct RequestTracingService<S> {
    service: S,
}

fn incoming_request_id(req: &ServiceRequest) -> Option<String> {
    req.headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty() && id.len() <= 64)
        .filter(|id| id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'))
        .map(str::to_string)
}

impl<S, B> Service<ServiceRequest> for RequestTracingService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let start = Instant::now();
        let request_id = incoming_request_id(&req).unwrap_or_else(|| Uuid::new_v4().to_string());
        let span = info_span!(
            "request",
            request_id = %request_id,
            method = %req.method(),
            path = %req.path(),
        );

        let http_req = req.request().clone();
        let fut = {
            let _entered = span.enter();
            self.service.call(req)
        };

        Box::pin(
            async move {
                let mut res = match fut.await {
                    Ok(res) => res.map_into_left_body(),
                    Err(err) => ServiceResponse::from_err(err, http_req).map_into_right_body(),
                };
                let elapsed_ms = start.elapsed().as_millis();
                let status = res.status();

                let headers = res.headers_mut();
                if let Ok(value) = HeaderValue::from_str(&request_id) {
                    headers.insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
                }
                if let Ok(value) = HeaderValue::from_str(&format!("{}ms", elapsed_ms)) {
                    headers.insert(HeaderName::from_static(RESPONSE_TIME_HEADER), value);
                }

                if status.is_server_error() {
                    warn!(status = status.as_u16(), elapsed_ms, "Request failed");
                } else {
                    info!(status = status.as_u16(), elapsed_ms, "Request processed");
                }
                Ok(res)
            }
            .instrument(span),
        )
    }
}

/// Verifies `Authorization: Bearer <token>` when present.
///
/// Requests without the header pass through untouched; public routes never
/// look at the outcome. A valid token adds an [`AuthenticatedUser`] to the
/// request extensions, an invalid one adds an [`AuthRejection`].
#[derive(Clone)]
pub struct JwtAuthMiddleware {
    keys: Rc<TokenKeys>,
}

impl JwtAuthMiddleware {
    pub fn new(keys: TokenKeys) -> Self {
        Self { keys: Rc::new(keys) }
    }
}

impl<S, B> Transform<S, ServiceRequest> for JwtAuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = JwtAuthMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(JwtAuthMiddlewareService {
            service,
            keys: self.keys.clone(),
        }))
    }
}

pub struct JwtAuthMiddlewareService<S> {
    service: S,
    keys: Rc<TokenKeys>,
}

impl<S> JwtAuthMiddlewareService<S> {
    fn authenticate(&self, header: &HeaderValue) -> Result<AuthenticatedUser, AuthRejection> {
        let token = header
            .to_str()
            .ok()
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AuthRejection("Invalid authorization header format".to_string()))?;

        let claims = self
            .keys
            .verify(token)
            .map_err(|e| AuthRejection(format!("Invalid token: {}", e)))?;

        Ok(AuthenticatedUser {
            id: claims.sub,
            name: claims.name,
            kind: claims.role,
        })
    }
}

impl<S, B> Service<ServiceRequest> for JwtAuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let outcome = req
            .headers()
            .get(AUTHORIZATION)
            .map(|header| self.authenticate(header));

        match outcome {
            Some(Ok(user)) => {
                debug!(account_id = %user.id, kind = %user.kind, "Bearer token accepted");
                req.extensions_mut().insert(user);
            }
            Some(Err(rejection)) => {
                debug!(reason = %rejection.0, "Bearer token rejected");
                req.extensions_mut().insert(rejection);
            }
            None => {}
        }

        Box::pin(self.service.call(req))
    }
}
