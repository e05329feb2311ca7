use tonic::{Request, Response, Status};

use super::RpcObserver;
use crate::domain::payment::PaymentProcessor;
use crate::domain::Money;
use crate::models::CreditCard;
use crate::proto::{self as pb, required, PaymentService};

pub struct PaymentServiceImpl {
    processor: PaymentProcessor,
    rpc: RpcObserver,
}

impl PaymentServiceImpl {
    pub fn new(processor: PaymentProcessor, rpc: RpcObserver) -> Self {
        Self { processor, rpc }
    }
}

#[tonic::async_trait]
impl PaymentService for PaymentServiceImpl {
    #[tracing::instrument(skip_all)]
    async fn charge(
        &self,
        request: Request<pb::ChargeRequest>,
    ) -> Result<Response<pb::ChargeResponse>, Status> {
        let req = request.into_inner();
        self.rpc
            .observe("Charge", async {
                let amount = Money::from(required(req.amount, "amount")?);
                let card = CreditCard::from(required(req.credit_card, "credit_card")?);
                let transaction_id = self.processor.charge(&amount, &card)?;
                Ok(pb::ChargeResponse { transaction_id })
            })
            .await
    }
}
