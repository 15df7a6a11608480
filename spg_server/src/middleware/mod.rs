mod operator;
mod signature;

pub use operator::{OperatorId, OperatorMiddlewareFactory, OperatorMiddlewareService};
pub use signature::{SignatureMiddlewareFactory, SignatureMiddlewareService, VerifiedPayload, SIGNATURE_HEADERS};
