//! Operator access middleware.
//! This middleware can be placed on any route or service.
//!
//! It reads the caller's user id from the `x-operator-id` header and checks it against the operator allow-list held in
//! the [`OperatorAccess`] app data. If an admin API token is configured, the `x-admin-token` header must match it too.
//! Authorised requests continue with an [`OperatorId`] in the request extensions. Everything else gets a 400 (no
//! usable id) or a 403.

use std::{pin::Pin, rc::Rc, str::FromStr};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web,
    Error,
    HttpMessage,
};
use futures::{
    future::{ok, Ready},
    Future,
};
use log::{debug, warn};
use spg_engine::db_types::UserId;

use crate::{config::OperatorAccess, errors::ServerError};

pub const OPERATOR_ID_HEADER: &str = "x-operator-id";
pub const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// The authenticated operator making an admin request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatorId(pub UserId);

#[derive(Default)]
pub struct OperatorMiddlewareFactory;

impl OperatorMiddlewareFactory {
    pub fn new() -> Self {
        OperatorMiddlewareFactory
    }
}

impl<S, B> Transform<S, ServiceRequest> for OperatorMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = OperatorMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(OperatorMiddlewareService { service: Rc::new(service) })
    }
}

pub struct OperatorMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for OperatorMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        Box::pin(async move {
            let access = req.app_data::<web::Data<OperatorAccess>>().cloned().ok_or_else(|| {
                warn!("🛂️ No operator access list was configured for this route");
                ServerError::ConfigurationError("No operator access list".into())
            })?;
            let operator = req
                .headers()
                .get(OPERATOR_ID_HEADER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| UserId::from_str(s.trim()).ok())
                .ok_or(ServerError::MissingOperatorId)?;
            let token = req.headers().get(ADMIN_TOKEN_HEADER).and_then(|v| v.to_str().ok());
            if !access.token_matches(token) {
                warn!("🛂️ Admin request from {operator} with a missing or invalid admin token");
                return Err(Error::from(ServerError::InsufficientPermissions("Invalid admin token".into())));
            }
            if !access.is_operator(operator) {
                warn!("🛂️ User {operator} is not an operator. Denying access to {}", req.path());
                return Err(Error::from(ServerError::InsufficientPermissions(format!("User {operator} is not an operator"))));
            }
            debug!("🛂️ Operator {operator} authorised for {}", req.path());
            req.extensions_mut().insert(OperatorId(operator));
            service.call(req).await
        })
    }
}
