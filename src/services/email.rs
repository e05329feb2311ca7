use tonic::{Request, Response, Status};

use super::RpcObserver;
use crate::domain::email::render_confirmation;
use crate::domain::ServiceError;
use crate::models::OrderResult;
use crate::proto::{self as pb, required, EmailService};

/// Renders confirmations and logs them in place of sending mail.
pub struct EmailServiceImpl {
    rpc: RpcObserver,
}

impl EmailServiceImpl {
    pub fn new(rpc: RpcObserver) -> Self {
        Self { rpc }
    }
}

#[tonic::async_trait]
impl EmailService for EmailServiceImpl {
    #[tracing::instrument(skip_all, fields(email = %request.get_ref().email))]
    async fn send_order_confirmation(
        &self,
        request: Request<pb::SendOrderConfirmationRequest>,
    ) -> Result<Response<pb::Empty>, Status> {
        let req = request.into_inner();
        self.rpc
            .observe("SendOrderConfirmation", async {
                if req.email.trim().is_empty() {
                    return Err(ServiceError::validation("email is required"));
                }
                let order = OrderResult::try_from(required(req.order, "order")?)?;
                let confirmation = render_confirmation(&order)?;

                tracing::debug!(body = %confirmation, "Rendered order confirmation");
                tracing::info!(
                    order_id = %order.order_id,
                    email = %req.email,
                    "📧 Order confirmation sent"
                );
                Ok(pb::Empty {})
            })
            .await
    }
}
