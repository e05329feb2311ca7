use std::sync::Arc;

use tonic::{Request, Response, Status};

use super::RpcObserver;
use crate::domain::currency::ExchangeRates;
use crate::domain::Money;
use crate::proto::{self as pb, required, CurrencyService};

pub struct CurrencyServiceImpl {
    rates: Arc<ExchangeRates>,
    rpc: RpcObserver,
}

impl CurrencyServiceImpl {
    pub fn new(rates: Arc<ExchangeRates>, rpc: RpcObserver) -> Self {
        Self { rates, rpc }
    }
}

#[tonic::async_trait]
impl CurrencyService for CurrencyServiceImpl {
    #[tracing::instrument(skip_all)]
    async fn get_supported_currencies(
        &self,
        _request: Request<pb::Empty>,
    ) -> Result<Response<pb::GetSupportedCurrenciesResponse>, Status> {
        self.rpc
            .observe("GetSupportedCurrencies", async {
                Ok(pb::GetSupportedCurrenciesResponse {
                    currency_codes: self.rates.supported_currencies(),
                })
            })
            .await
    }

    #[tracing::instrument(skip_all, fields(to = %request.get_ref().to_code))]
    async fn convert(
        &self,
        request: Request<pb::CurrencyConversionRequest>,
    ) -> Result<Response<pb::Money>, Status> {
        let req = request.into_inner();
        self.rpc
            .observe("Convert", async {
                let from = Money::from(required(req.from, "from")?);
                let converted = self.rates.convert(&from, &req.to_code)?;
                tracing::debug!(from = %from, to = %converted, "Converted");
                Ok(converted.into())
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proto::{CurrencyServiceClient, CurrencyServiceServer};
    use crate::services::testing;
    use tonic::service::Routes;

    async fn client() -> CurrencyServiceClient<tonic::transport::Channel> {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/data/currency_conversion.json");
        let rates = Arc::new(ExchangeRates::load(std::path::Path::new(path)).unwrap());
        let service = CurrencyServiceImpl::new(rates, RpcObserver::new("currency"));
        let channel = testing::spawn(Routes::new(CurrencyServiceServer::new(service))).await;
        CurrencyServiceClient::new(channel)
    }

    #[tokio::test]
    async fn test_supported_currencies_are_sorted() {
        let mut client = client().await;

        let codes = client
            .get_supported_currencies(pb::Empty {})
            .await
            .unwrap()
            .into_inner()
            .currency_codes;
        assert!(codes.contains(&"USD".to_string()));
        assert!(codes.windows(2).all(|w| w[0] <= w[1]));
    }

    #[tokio::test]
    async fn test_convert_usd_to_eur() {
        let mut client = client().await;

        let money = client
            .convert(pb::CurrencyConversionRequest {
                from: Some(pb::Money {
                    currency_code: "USD".into(),
                    units: 11,
                    nanos: 305_000_000,
                }),
                to_code: "EUR".into(),
            })
            .await
            .unwrap()
            .into_inner();
        assert_eq!(money.currency_code, "EUR");
        // 11.305 / 1.1305 is 10 up to float truncation
        let total_nanos = money.units as i64 * 1_000_000_000 + money.nanos as i64;
        assert!((total_nanos - 10_000_000_000).abs() <= 2);
    }

    #[tokio::test]
    async fn test_unknown_currency_is_invalid_argument() {
        let mut client = client().await;

        let status = client
            .convert(pb::CurrencyConversionRequest {
                from: Some(pb::Money {
                    currency_code: "USD".into(),
                    units: 1,
                    nanos: 0,
                }),
                to_code: "XXX".into(),
            })
            .await
            .unwrap_err();
        assert_eq!(status.code(), tonic::Code::InvalidArgument);
    }
}
