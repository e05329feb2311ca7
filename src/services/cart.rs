use std::sync::Arc;

use tonic::{Request, Response, Status};

use super::RpcObserver;
use crate::domain::cart::CartRepository;
use crate::proto::{self as pb, required, CartService};

pub struct CartServiceImpl {
    repo: Arc<CartRepository>,
    rpc: RpcObserver,
}

impl CartServiceImpl {
    pub fn new(repo: Arc<CartRepository>, rpc: RpcObserver) -> Self {
        Self { repo, rpc }
    }
}

#[tonic::async_trait]
impl CartService for CartServiceImpl {
    #[tracing::instrument(skip_all, fields(user_id = %request.get_ref().user_id))]
    async fn add_item(
        &self,
        request: Request<pb::AddItemRequest>,
    ) -> Result<Response<pb::Empty>, Status> {
        let req = request.into_inner();
        self.rpc
            .observe("AddItem", async {
                let item = required(req.item, "item")?;
                self.repo.add_item(&req.user_id, item.into()).await?;
                Ok(pb::Empty {})
            })
            .await
    }

    #[tracing::instrument(skip_all, fields(user_id = %request.get_ref().user_id))]
    async fn get_cart(
        &self,
        request: Request<pb::GetCartRequest>,
    ) -> Result<Response<pb::Cart>, Status> {
        let req = request.into_inner();
        self.rpc
            .observe("GetCart", async {
                let items = self.repo.get_cart(&req.user_id).await?;
                Ok(pb::Cart {
                    user_id: req.user_id,
                    items: items.into_iter().map(Into::into).collect(),
                })
            })
            .await
    }

    #[tracing::instrument(skip_all, fields(user_id = %request.get_ref().user_id))]
    async fn empty_cart(
        &self,
        request: Request<pb::EmptyCartRequest>,
    ) -> Result<Response<pb::Empty>, Status> {
        let req = request.into_inner();
        self.rpc
            .observe("EmptyCart", async {
                self.repo.empty_cart(&req.user_id).await?;
                Ok(pb::Empty {})
            })
            .await
    }
}
