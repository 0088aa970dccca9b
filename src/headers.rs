use actix_cors::Cors;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::{Error, http::{header, Method}};
use futures_util::future::{LocalBoxFuture, ready, Ready};
use std::rc::Rc;

pub const ALLOWED_HEADERS: &str = "Content-Type, Authorization";
pub const ALLOWED_METHODS: &str = "GET, POST, PATCH, DELETE, OPTIONS";

/// Open CORS policy for `/api/*`: any origin, JSON + bearer headers.
pub fn api_cors() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allowed_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE, Method::OPTIONS])
        .allowed_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(3600)
}

/// Advertises the accepted request headers and methods on every response
/// that does not already carry them.
#[derive(Clone)]
pub struct ApiHeaders {
    pub allow_headers: &'static str,
    pub allow_methods: &'static str,
}

impl Default for ApiHeaders {
    fn default() -> Self {
        Self { allow_headers: ALLOWED_HEADERS, allow_methods: ALLOWED_METHODS }
    }
}

impl<S, B> Transform<S, ServiceRequest> for ApiHeaders
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = ApiHeadersMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(ApiHeadersMiddleware {
            service: Rc::new(service),
            cfg: self.clone(),
        }))
    }
}

pub struct ApiHeadersMiddleware<S> {
    service: Rc<S>,
    cfg: ApiHeaders,
}

impl<S, B> Service<ServiceRequest> for ApiHeadersMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &self,
        ctx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let svc = self.service.clone();
        let cfg = self.cfg.clone();
        Box::pin(async move {
            let mut res = svc.call(req).await?;
            let headers = res.response_mut().headers_mut();
            if !headers.contains_key(header::ACCESS_CONTROL_ALLOW_HEADERS) {
                headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, header::HeaderValue::from_static(cfg.allow_headers));
            }
            if !headers.contains_key(header::ACCESS_CONTROL_ALLOW_METHODS) {
                headers.insert(header::ACCESS_CONTROL_ALLOW_METHODS, header::HeaderValue::from_static(cfg.allow_methods));
            }
            Ok(res)
        })
    }
}
