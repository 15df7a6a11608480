//! IPN signature middleware for Actix Web.
//!
//! NOWPayments signs each callback with HMAC-SHA512 over the canonical form of the JSON body, using the IPN secret as
//! the key, and sends the hex digest in the `x-nowpayments-sig` header (`x-signature` is accepted too).
//!
//! Wrap the webhook scope with this middleware. Requests without a signature header, or whose signature does not
//! match, are rejected with a 400 before any handler sees them. For valid requests, the parsed body is stored in the
//! request extensions as a [`VerifiedPayload`], and the raw body is put back so that handlers can still read it.

use std::{
    future::{ready, Ready},
    rc::Rc,
};

use actix_http::h1;
use actix_web::{
    dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform},
    web,
    Error,
    HttpMessage,
};
use futures::future::LocalBoxFuture;
use log::{trace, warn};
use nowpayments_tools::{verify_ipn_signature, SignatureError};
use serde_json::Value;
use spg_common::Secret;

use crate::errors::ServerError;

/// The headers that may carry the IPN signature, in order of preference.
pub const SIGNATURE_HEADERS: [&str; 2] = ["x-nowpayments-sig", "x-signature"];

/// A callback body whose signature has been checked.
#[derive(Debug, Clone)]
pub struct VerifiedPayload(pub Value);

pub struct SignatureMiddlewareFactory {
    secret: Secret<String>,
}

impl SignatureMiddlewareFactory {
    pub fn new(secret: Secret<String>) -> Self {
        SignatureMiddlewareFactory { secret }
    }
}

impl<S, B> Transform<S, ServiceRequest> for SignatureMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = SignatureMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SignatureMiddlewareService { secret: self.secret.clone(), service: Rc::new(service) }))
    }
}

pub struct SignatureMiddlewareService<S> {
    secret: Secret<String>,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for SignatureMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let secret = self.secret.clone();
        Box::pin(async move {
            trace!("🔐️ Checking IPN signature for request");
            let signature = SIGNATURE_HEADERS
                .iter()
                .find_map(|h| req.headers().get(*h))
                .and_then(|v| v.to_str().ok())
                .map(String::from)
                .ok_or_else(|| {
                    warn!("🔐️ No signature header found in callback. Denying access.");
                    ServerError::MissingSignature
                })?;
            let data = req.extract::<web::Bytes>().await.map_err(|e| {
                warn!("🔐️ Failed to extract request data: {e:?}");
                ServerError::InvalidRequest("Failed to extract request data.".into())
            })?;
            match verify_ipn_signature(&secret, data.as_ref(), &signature) {
                Ok(payload) => {
                    trace!("🔐️ IPN signature check ✅️");
                    req.extensions_mut().insert(VerifiedPayload(payload));
                    req.set_payload(bytes_to_payload(data));
                    service.call(req).await
                },
                Err(SignatureError::NoSecret) => {
                    warn!("🔐️ No IPN secret is configured, so callbacks cannot be verified. Denying access.");
                    Err(Error::from(ServerError::InvalidSignature))
                },
                Err(e) => {
                    warn!("🔐️ Invalid IPN callback. {e}. Denying access.");
                    Err(Error::from(ServerError::InvalidSignature))
                },
            }
        })
    }
}

fn bytes_to_payload(buf: web::Bytes) -> Payload {
    let (_, mut pl) = h1::Payload::create(true);
    pl.unread_data(buf);
    Payload::from(pl)
}
