use std::{collections::HashSet, fmt::Debug};

use log::*;

use crate::{
    db_types::{OrderId, OrderStatusType, UserId},
    events::{EventProducers, OrderPaidEvent, SettlementSource},
    spg_api::errors::OrderFlowError,
    traits::{PaidTransition, PaymentGatewayDatabase},
};

/// Lets a trusted operator force an order to `paid` without a gateway callback.
///
/// The same `pending → paid` transition as a webhook settlement is used, so top-up credits still happen exactly once,
/// and an order in `error` still cannot be paid.
pub struct ManualOverrideApi<B> {
    db: B,
    producers: EventProducers,
    operators: HashSet<UserId>,
}

impl<B> Debug for ManualOverrideApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ManualOverrideApi ({} operators)", self.operators.len())
    }
}

impl<B> ManualOverrideApi<B> {
    pub fn new<I: IntoIterator<Item = UserId>>(db: B, producers: EventProducers, operators: I) -> Self {
        Self { db, producers, operators: operators.into_iter().collect() }
    }

    pub fn is_operator(&self, user_id: UserId) -> bool {
        self.operators.contains(&user_id)
    }
}

impl<B> ManualOverrideApi<B>
where B: PaymentGatewayDatabase
{
    /// Marks the order as paid on behalf of `operator`.
    ///
    /// * Callers that are not on the operator list get [`OrderFlowError::PermissionDenied`] and nothing changes.
    /// * Unknown orders give [`OrderFlowError::OrderNotFound`].
    /// * Orders that are already paid succeed with [`PaidTransition::AlreadyPaid`] and no second credit.
    /// * Orders in `error` give [`OrderFlowError::InvalidTransition`].
    pub async fn force_mark_paid(
        &self,
        operator: UserId,
        order_id: &OrderId,
    ) -> Result<PaidTransition, OrderFlowError> {
        if !self.is_operator(operator) {
            warn!("🛂️ User {operator} tried to mark order [{order_id}] as paid, but is not an operator");
            return Err(OrderFlowError::PermissionDenied(format!("User {operator} is not an operator")));
        }
        let order = self
            .db
            .fetch_order_by_order_id(order_id)
            .await?
            .ok_or_else(|| OrderFlowError::OrderNotFound(order_id.clone()))?;
        if order.status == OrderStatusType::Error {
            return Err(OrderFlowError::InvalidTransition {
                order_id: order_id.clone(),
                from: order.status.to_string(),
                to: OrderStatusType::Paid.to_string(),
            });
        }
        let transition = self.db.mark_paid(order_id).await?;
        match &transition {
            PaidTransition::Transitioned { order, credited } => {
                info!("🛂️ Operator {operator} marked order [{order_id}] as paid");
                let source = SettlementSource::Operator(operator);
                for emitter in &self.producers.order_paid_producer {
                    emitter.publish_event(OrderPaidEvent::new(order.clone(), *credited, source)).await;
                }
            },
            PaidTransition::AlreadyPaid(_) => info!("🛂️ Order [{order_id}] was already paid. Operator {operator} changed nothing"),
        }
        Ok(transition)
    }
}
