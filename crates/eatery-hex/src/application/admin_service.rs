use crate::errors::AppError;
use eatery_types::domain::money::Money;
use eatery_types::domain::order::{FulfillmentStatus, Order};
use eatery_types::domain::payment::PaymentReference;
use eatery_types::domain::profile::Profile;
use eatery_types::ports::order_repository::OrderRepository;
use eatery_types::ports::payment_gateway::{PaymentGateway, TransactionStatus};
use eatery_types::ports::profile_repository::ProfileRepository;
use serde::Serialize;
use uuid::Uuid;

const RECENT_ORDERS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SalesSummary {
    pub total_orders: usize,
    pub total_revenue: Money,
    pub pending_orders: usize,
    pub recent_orders: Vec<Order>,
}

/// Gateway view and stored order for one payment reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaymentReconciliation {
    pub reference: PaymentReference,
    pub gateway_status: Option<TransactionStatus>,
    pub gateway_amount: Option<i64>,
    pub gateway_error: Option<String>,
    pub order: Option<Order>,
}

impl PaymentReconciliation {
    /// Paid at the gateway with no order on our side.
    pub fn needs_manual_order(&self) -> bool {
        self.gateway_status == Some(TransactionStatus::Success) && self.order.is_none()
    }
}

/// Back-office operations over orders, customers and payments.
pub struct AdminService<R, G> {
    repo: R,
    gateway: G,
}

impl<R, G> AdminService<R, G>
where
    R: OrderRepository + ProfileRepository,
    G: PaymentGateway,
{
    pub fn new(repo: R, gateway: G) -> Self {
        Self { repo, gateway }
    }

    pub async fn list_orders(&self) -> Result<Vec<Order>, AppError> {
        Ok(OrderRepository::list(&self.repo).await?)
    }

    pub async fn get_order(&self, id: Uuid) -> Result<Order, AppError> {
        match OrderRepository::get(&self.repo, id).await? {
            Some(o) => Ok(o),
            None => Err(AppError::NotFound(format!("order {}", id))),
        }
    }

    pub async fn orders_for_user(&self, user_id: Uuid) -> Result<Vec<Order>, AppError> {
        Ok(self.repo.list_for_user(user_id).await?)
    }

    pub async fn update_status(
        &self,
        id: Uuid,
        status: FulfillmentStatus,
    ) -> Result<Order, AppError> {
        match self.repo.update_status(id, status).await? {
            Some(o) => {
                tracing::info!(order_id = %id, status = status.as_str(), "order status updated");
                Ok(o)
            }
            None => Err(AppError::NotFound(format!("order {}", id))),
        }
    }

    /// Moves the order one kitchen step forward.
    pub async fn advance_status(&self, id: Uuid) -> Result<Order, AppError> {
        let order = self.get_order(id).await?;
        let next = order.status.next().ok_or_else(|| {
            AppError::BadRequest(format!("order {} is already {}", id, order.status.as_str()))
        })?;
        self.update_status(id, next).await
    }

    pub async fn sales_summary(&self) -> Result<SalesSummary, AppError> {
        let orders = OrderRepository::list(&self.repo).await?;
        Ok(SalesSummary {
            total_orders: orders.len(),
            total_revenue: orders.iter().map(|o| o.total).sum(),
            pending_orders: orders
                .iter()
                .filter(|o| o.status == FulfillmentStatus::Pending)
                .count(),
            recent_orders: orders.into_iter().take(RECENT_ORDERS).collect(),
        })
    }

    pub async fn list_customers(&self) -> Result<Vec<Profile>, AppError> {
        Ok(self.repo.list_profiles().await?)
    }

    pub async fn set_customer_active(&self, id: Uuid, active: bool) -> Result<Profile, AppError> {
        match self.repo.set_active(id, active).await? {
            Some(p) => {
                tracing::info!(user_id = %id, active, "customer access changed");
                Ok(p)
            }
            None => Err(AppError::NotFound(format!("customer {}", id))),
        }
    }

    /// Support lookup for "I paid but have no order" reports.
    pub async fn reconcile_payment(
        &self,
        reference: &str,
    ) -> Result<PaymentReconciliation, AppError> {
        let reference = PaymentReference::new(reference.trim());
        if reference.is_blank() {
            return Err(AppError::BadRequest("payment reference is empty".into()));
        }
        let order = self.repo.get_by_reference(&reference).await?;
        let (gateway_status, gateway_amount, gateway_error) =
            match self.gateway.verify(&reference).await {
                Ok(v) => (Some(v.status), v.amount_minor, None),
                Err(e) => (None, None, Some(e.to_string())),
            };
        let report = PaymentReconciliation {
            reference,
            gateway_status,
            gateway_amount,
            gateway_error,
            order,
        };
        if report.needs_manual_order() {
            tracing::warn!(reference = %report.reference, "paid transaction has no order");
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use eatery_repo::memory::InMemoryRepo;
    use eatery_types::domain::order::OrderLine;
    use eatery_types::ports::payment_gateway::{
        GatewayError, InitializeTransaction, InitializedTransaction, VerifiedTransaction,
    };

    struct StubGateway;

    #[async_trait]
    impl PaymentGateway for StubGateway {
        async fn initialize(
            &self,
            _: InitializeTransaction,
        ) -> Result<InitializedTransaction, GatewayError> {
            Err(GatewayError::Rejected("not used".into()))
        }

        async fn verify(
            &self,
            reference: &PaymentReference,
        ) -> Result<VerifiedTransaction, GatewayError> {
            if reference.as_str() == "ref_gone" {
                return Err(GatewayError::Rejected("Transaction reference not found".into()));
            }
            Ok(VerifiedTransaction {
                reference: reference.clone(),
                status: TransactionStatus::Success,
                amount_minor: Some(10000),
                gateway_response: Some("Successful".into()),
            })
        }
    }

    fn line(cents: i64, quantity: u32) -> OrderLine {
        OrderLine {
            id: "burger".into(),
            name: "Burger".into(),
            price: Money::from_cents(cents),
            quantity,
            customization: None,
        }
    }

    async fn seed(repo: &InMemoryRepo, reference: &str, cents: i64) -> Order {
        let order = Order::paid(
            Uuid::new_v4(),
            vec![line(cents, 1)],
            "1 Long St".into(),
            PaymentReference::new(reference),
        )
        .unwrap();
        repo.insert_if_absent(order).await.unwrap().into_order()
    }

    #[tokio::test]
    async fn advance_walks_the_kitchen_flow_and_stops_at_delivered() {
        let repo = InMemoryRepo::new();
        let order = seed(&repo, "ref_a", 5000).await;
        let svc = AdminService::new(repo, StubGateway);

        for expected in [
            FulfillmentStatus::Preparing,
            FulfillmentStatus::Ready,
            FulfillmentStatus::Delivered,
        ] {
            assert_eq!(svc.advance_status(order.id).await.unwrap().status, expected);
        }
        assert!(matches!(
            svc.advance_status(order.id).await,
            Err(AppError::BadRequest(_))
        ));
    }

    #[tokio::test]
    async fn missing_rows_are_not_found() {
        let svc = AdminService::new(InMemoryRepo::new(), StubGateway);
        let id = Uuid::new_v4();
        assert!(matches!(svc.get_order(id).await, Err(AppError::NotFound(_))));
        assert!(matches!(
            svc.update_status(id, FulfillmentStatus::Ready).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            svc.set_customer_active(id, false).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn summary_counts_revenue_and_pending() {
        let repo = InMemoryRepo::new();
        let first = seed(&repo, "ref_1", 5000).await;
        for (i, cents) in [7000, 1250, 900, 3000, 4000].into_iter().enumerate() {
            seed(&repo, &format!("ref_{}", i + 2), cents).await;
        }
        let svc = AdminService::new(repo, StubGateway);
        svc.update_status(first.id, FulfillmentStatus::Delivered)
            .await
            .unwrap();

        let summary = svc.sales_summary().await.unwrap();
        assert_eq!(summary.total_orders, 6);
        assert_eq!(summary.total_revenue, Money::from_cents(21150));
        assert_eq!(summary.pending_orders, 5);
        assert_eq!(summary.recent_orders.len(), 5);
    }

    #[tokio::test]
    async fn reconcile_flags_paid_reference_without_order() {
        let repo = InMemoryRepo::new();
        seed(&repo, "ref_known", 10000).await;
        let svc = AdminService::new(repo, StubGateway);

        let known = svc.reconcile_payment("ref_known").await.unwrap();
        assert!(known.order.is_some());
        assert!(!known.needs_manual_order());

        let orphan = svc.reconcile_payment(" ref_orphan ").await.unwrap();
        assert_eq!(orphan.reference.as_str(), "ref_orphan");
        assert!(orphan.needs_manual_order());

        let gone = svc.reconcile_payment("ref_gone").await.unwrap();
        assert_eq!(gone.gateway_status, None);
        assert!(gone.gateway_error.unwrap().contains("not found"));

        assert!(matches!(
            svc.reconcile_payment("  ").await,
            Err(AppError::BadRequest(_))
        ));
    }
}
