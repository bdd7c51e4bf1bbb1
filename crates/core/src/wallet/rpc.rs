//! Watch-only wallet over Ethereum JSON-RPC.
//!
//! Reads balances with `eth_call` and follows submitted transactions through
//! `eth_getTransactionReceipt`. It holds no keys, so it cannot submit
//! transfers itself.

use std::time::Duration;

use alloy_primitives::{Address, Bytes, TxKind};
use alloy_provider::{Provider, ProviderBuilder};
use alloy_rpc_types::eth::{TransactionInput, TransactionRequest};
use alloy_sol_types::{SolCall, sol};
use castpos_types::{CurrencyAmount, TransferHandle, TransferOutcome};
use tracing::{debug, info};
use url::Url;

use super::{WalletError, WalletProvider};

sol! {
    #[allow(non_camel_case_types)]
    interface IERC20 {
        function balanceOf(address owner) external view returns (uint256);
    }
}

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
pub const DEFAULT_CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(120);

/// Map a receipt's EIP-658 status to an outcome. Receipts without one
/// (pre-Byzantium `root` receipts) cannot tell success from failure.
fn receipt_outcome(status: Option<bool>) -> TransferOutcome {
    match status {
        Some(true) => TransferOutcome::Settled,
        Some(false) => TransferOutcome::Failed {
            reason: "transaction reverted".to_string(),
        },
        None => TransferOutcome::Failed {
            reason: "receipt has no status".to_string(),
        },
    }
}

#[derive(Debug, Clone)]
pub struct RpcWallet {
    rpc_url: Url,
    owner: Option<Address>,
    poll_interval: Duration,
    confirmation_timeout: Duration,
}

impl RpcWallet {
    pub fn new(rpc_url: Url, owner: Option<Address>) -> Self {
        Self {
            rpc_url,
            owner,
            poll_interval: DEFAULT_POLL_INTERVAL,
            confirmation_timeout: DEFAULT_CONFIRMATION_TIMEOUT,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_confirmation_timeout(mut self, timeout: Duration) -> Self {
        self.confirmation_timeout = timeout;
        self
    }

    fn provider(&self) -> impl Provider {
        ProviderBuilder::new()
            .disable_recommended_fillers()
            .connect_http(self.rpc_url.clone())
    }

    async fn call_view(&self, to: Address, data: Bytes) -> Result<Bytes, WalletError> {
        let mut tx = TransactionRequest::default().input(TransactionInput::from(data));
        tx.to = Some(TxKind::Call(to));

        let provider = self.provider();
        provider
            .call(tx)
            .await
            .map_err(|e| WalletError::Rpc(format!("eth_call failed: {e}")))
    }

    async fn poll_receipt(&self, handle: TransferHandle) -> Result<TransferOutcome, WalletError> {
        let provider = self.provider();
        loop {
            let receipt = provider
                .get_transaction_receipt(handle.tx_hash())
                .await
                .map_err(|e| WalletError::Rpc(format!("eth_getTransactionReceipt failed: {e}")))?;
            let Some(receipt) = receipt else {
                debug!("No receipt yet for {}", handle);
                tokio::time::sleep(self.poll_interval).await;
                continue;
            };
            let status = receipt
                .inner
                .as_receipt()
                .and_then(|receipt| receipt.status.as_eip658());
            return Ok(receipt_outcome(status));
        }
    }
}

impl WalletProvider for RpcWallet {
    async fn connected_address(&self) -> Option<Address> {
        self.owner
    }

    async fn token_balance(
        &self,
        token: Address,
        owner: Address,
    ) -> Result<CurrencyAmount, WalletError> {
        let calldata = IERC20::balanceOfCall { owner }.abi_encode();
        let raw = self.call_view(token, Bytes::from(calldata)).await?;
        let balance = IERC20::balanceOfCall::abi_decode_returns(&raw)
            .map_err(|e| WalletError::Rpc(format!("Malformed balanceOf return: {e}")))?;
        Ok(CurrencyAmount::from(balance))
    }

    async fn submit_transfer(
        &self,
        _token: Address,
        _to: Address,
        _amount: CurrencyAmount,
    ) -> Result<TransferHandle, WalletError> {
        Err(WalletError::TransferRejected(
            "watch-only RPC wallet cannot sign transfers".to_string(),
        ))
    }

    async fn await_confirmation(
        &self,
        handle: TransferHandle,
    ) -> Result<TransferOutcome, WalletError> {
        info!("Waiting for confirmation of {}", handle);
        tokio::time::timeout(self.confirmation_timeout, self.poll_receipt(handle))
            .await
            .map_err(|_| WalletError::TransferTimedOut)?
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use alloy_primitives::{B256, address};
    use axum::{Json, Router, extract::State, routing::post};
    use serde_json::{Value, json};

    use super::*;

    const TOKEN: Address = address!("0x75faf114eafb1BDbe2F0316DF893fd58CE46AA4d");
    const MERCHANT: Address = address!("0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed");

    /// Serve `router` on an ephemeral port and return its URL
    async fn spawn_rpc(router: Router) -> Url {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}").parse().unwrap()
    }

    fn reply(request: &Value, result: Value) -> Json<Value> {
        Json(json!({ "jsonrpc": "2.0", "id": request["id"], "result": result }))
    }

    /// A post-Byzantium EIP-1559 receipt as nodes return it
    fn receipt(status: &str) -> Value {
        json!({
            "type": "0x2",
            "status": status,
            "cumulativeGasUsed": "0xb411",
            "logs": [],
            "logsBloom": format!("0x{}", "0".repeat(512)),
            "transactionHash": B256::repeat_byte(0xab),
            "transactionIndex": "0x0",
            "blockHash": B256::repeat_byte(0x01),
            "blockNumber": "0x10",
            "gasUsed": "0xb411",
            "effectiveGasPrice": "0x3b9aca00",
            "from": MERCHANT,
            "to": TOKEN,
            "contractAddress": null
        })
    }

    #[test]
    fn test_balance_of_calldata() {
        let calldata = IERC20::balanceOfCall { owner: MERCHANT }.abi_encode();
        assert_eq!(&calldata[..4], &[0x70, 0xa0, 0x82, 0x31]);
        assert_eq!(calldata.len(), 4 + 32);
        assert_eq!(&calldata[16..], MERCHANT.as_slice());
    }

    #[test]
    fn test_receipt_outcome() {
        assert_eq!(receipt_outcome(Some(true)), TransferOutcome::Settled);
        assert_eq!(
            receipt_outcome(Some(false)),
            TransferOutcome::Failed {
                reason: "transaction reverted".to_string()
            }
        );
        assert_eq!(
            receipt_outcome(None),
            TransferOutcome::Failed {
                reason: "receipt has no status".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_token_balance_via_eth_call() {
        let router = Router::new().route(
            "/",
            post(|Json(request): Json<Value>| async move {
                assert_eq!(request["method"], "eth_call");
                assert_eq!(
                    request["params"][0]["to"].as_str().map(str::to_lowercase),
                    Some("0x75faf114eafb1bdbe2f0316df893fd58ce46aa4d".to_string())
                );
                reply(
                    &request,
                    json!("0x0000000000000000000000000000000000000000000000000000000059682f00"),
                )
            }),
        );
        let wallet = RpcWallet::new(spawn_rpc(router).await, Some(MERCHANT));

        let balance = wallet.token_balance(TOKEN, MERCHANT).await.unwrap();
        assert_eq!(balance, CurrencyAmount::from(1_500_000_000u64));
        assert_eq!(wallet.connected_address().await, Some(MERCHANT));
    }

    #[tokio::test]
    async fn test_rpc_error_is_surfaced() {
        let router = Router::new().route(
            "/",
            post(|Json(request): Json<Value>| async move {
                Json(json!({
                    "jsonrpc": "2.0",
                    "id": request["id"],
                    "error": { "code": -32000, "message": "execution reverted" }
                }))
            }),
        );
        let wallet = RpcWallet::new(spawn_rpc(router).await, None);

        let err = wallet.token_balance(TOKEN, MERCHANT).await.unwrap_err();
        assert!(
            matches!(&err, WalletError::Rpc(message) if message.contains("execution reverted")),
            "{err}"
        );
    }

    #[tokio::test]
    async fn test_await_confirmation_polls_until_receipt() {
        let calls = Arc::new(AtomicUsize::new(0));
        let router = Router::new()
            .route(
                "/",
                post(
                    |State(calls): State<Arc<AtomicUsize>>, Json(request): Json<Value>| async move {
                        // first two polls: still pending
                        let result = if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                            Value::Null
                        } else {
                            receipt("0x1")
                        };
                        reply(&request, result)
                    },
                ),
            )
            .with_state(calls.clone());
        let wallet = RpcWallet::new(spawn_rpc(router).await, Some(MERCHANT))
            .with_poll_interval(Duration::from_millis(10));

        let outcome = wallet
            .await_confirmation(TransferHandle(B256::repeat_byte(0xab)))
            .await
            .unwrap();
        assert_eq!(outcome, TransferOutcome::Settled);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_reverted_receipt_fails() {
        let router = Router::new().route(
            "/",
            post(|Json(request): Json<Value>| async move { reply(&request, receipt("0x0")) }),
        );
        let wallet = RpcWallet::new(spawn_rpc(router).await, Some(MERCHANT));

        let outcome = wallet
            .await_confirmation(TransferHandle(B256::repeat_byte(0xab)))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            TransferOutcome::Failed {
                reason: "transaction reverted".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_confirmation_timeout() {
        let router = Router::new().route(
            "/",
            post(|Json(request): Json<Value>| async move { reply(&request, Value::Null) }),
        );
        let wallet = RpcWallet::new(spawn_rpc(router).await, Some(MERCHANT))
            .with_poll_interval(Duration::from_millis(10))
            .with_confirmation_timeout(Duration::from_millis(100));

        assert_eq!(
            wallet
                .await_confirmation(TransferHandle(B256::repeat_byte(0x02)))
                .await,
            Err(WalletError::TransferTimedOut)
        );
    }

    #[tokio::test]
    async fn test_cannot_submit() {
        let wallet = RpcWallet::new("http://127.0.0.1:1".parse().unwrap(), Some(MERCHANT));
        assert!(matches!(
            wallet
                .submit_transfer(TOKEN, MERCHANT, CurrencyAmount::from(1u64))
                .await,
            Err(WalletError::TransferRejected(_))
        ));
    }
}
