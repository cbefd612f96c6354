//! RPC-Backed Oracles
//!
//! Price simulation via on-chain quoter calls (UniswapV2 `getAmountsOut`,
//! UniswapV3 QuoterV2) and vault depth via ERC-20 `balanceOf`. Endpoints
//! are tried in registry order with a per-call timeout; a hop that cannot
//! be priced resolves to zero, matching the collaborator convention.

use alloy_primitives::{Address, Bytes, U256};
use alloy_provider::{Provider, ProviderBuilder};
use alloy_rpc_types::TransactionRequest;
use alloy_sol_types::{sol, SolCall};
use async_trait::async_trait;
use eyre::{eyre, Result};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

use super::{LiquidityOracle, PriceOracle};
use crate::registry::{ChainRegistry, DexId};

sol! {
    interface IUniswapV2Router {
        function getAmountsOut(uint256 amountIn, address[] calldata path)
            external view returns (uint256[] memory amounts);
    }

    interface IQuoterV2 {
        struct QuoteExactInputSingleParams {
            address tokenIn;
            address tokenOut;
            uint256 amountIn;
            uint24 fee;
            uint160 sqrtPriceLimitX96;
        }

        function quoteExactInputSingle(QuoteExactInputSingleParams memory params)
            external returns (
                uint256 amountOut,
                uint160 sqrtPriceX96After,
                uint32 initializedTicksCrossed,
                uint256 gasEstimate
            );
    }

    interface IERC20 {
        function balanceOf(address account) external view returns (uint256);
    }
}

/// Fee tier used for V3 quote simulation.
const V3_QUOTE_FEE: u32 = 500;

/// Issue an `eth_call` against a chain's endpoints in order, first
/// success wins.
async fn eth_call(
    registry: &ChainRegistry,
    chain_id: u64,
    to: Address,
    data: Bytes,
    call_timeout: Duration,
) -> Result<Bytes> {
    let chain = registry
        .get(chain_id)
        .ok_or_else(|| eyre!("chain {chain_id} not in registry"))?;

    let mut last_err = eyre!("no RPC endpoints configured for chain {chain_id}");
    for url in &chain.rpc_endpoints {
        let provider = match url.parse() {
            Ok(parsed) => ProviderBuilder::new().connect_http(parsed),
            Err(e) => {
                warn!(chain = chain_id, url = %url, "bad RPC url: {e}");
                continue;
            }
        };

        let tx = TransactionRequest::default().to(to).input(data.clone().into());
        match timeout(call_timeout, provider.call(tx)).await {
            Ok(Ok(bytes)) => return Ok(bytes),
            Ok(Err(e)) => {
                debug!(chain = chain_id, url = %url, "eth_call failed: {e}");
                last_err = e.into();
            }
            Err(_) => {
                debug!(chain = chain_id, url = %url, "eth_call timed out");
                last_err = eyre!("eth_call timed out after {call_timeout:?}");
            }
        }
    }
    Err(last_err)
}

// ============================================
// PRICE ORACLE
// ============================================

pub struct RpcPriceOracle {
    registry: Arc<ChainRegistry>,
    call_timeout: Duration,
}

impl RpcPriceOracle {
    pub fn new(registry: Arc<ChainRegistry>, call_timeout: Duration) -> Self {
        Self {
            registry,
            call_timeout,
        }
    }

    async fn quote_v2(
        &self,
        chain_id: u64,
        router: Address,
        token_in: Address,
        token_out: Address,
        amount_in: U256,
    ) -> U256 {
        let data = IUniswapV2Router::getAmountsOutCall {
            amountIn: amount_in,
            path: vec![token_in, token_out],
        }
        .abi_encode();

        match eth_call(&self.registry, chain_id, router, data.into(), self.call_timeout).await {
            Ok(raw) => IUniswapV2Router::getAmountsOutCall::abi_decode_returns(&raw)
                .ok()
                .and_then(|amounts| amounts.last().copied())
                .unwrap_or(U256::ZERO),
            Err(e) => {
                debug!(chain = chain_id, "v2 quote unavailable: {e}");
                U256::ZERO
            }
        }
    }

    async fn quote_v3(
        &self,
        chain_id: u64,
        quoter: Address,
        token_in: Address,
        token_out: Address,
        amount_in: U256,
    ) -> U256 {
        let data = IQuoterV2::quoteExactInputSingleCall {
            params: IQuoterV2::QuoteExactInputSingleParams {
                tokenIn: token_in,
                tokenOut: token_out,
                amountIn: amount_in,
                fee: alloy_primitives::Uint::from(V3_QUOTE_FEE),
                sqrtPriceLimitX96: alloy_primitives::Uint::ZERO,
            },
        }
        .abi_encode();

        match eth_call(&self.registry, chain_id, quoter, data.into(), self.call_timeout).await {
            Ok(raw) => IQuoterV2::quoteExactInputSingleCall::abi_decode_returns(&raw)
                .map(|ret| ret.amountOut)
                .unwrap_or(U256::ZERO),
            Err(e) => {
                debug!(chain = chain_id, "v3 quote unavailable: {e}");
                U256::ZERO
            }
        }
    }
}

#[async_trait]
impl PriceOracle for RpcPriceOracle {
    async fn quote(
        &self,
        chain_id: u64,
        dex: DexId,
        token_in: Address,
        token_out: Address,
        amount_in: U256,
    ) -> Result<U256> {
        let chain = self
            .registry
            .get(chain_id)
            .ok_or_else(|| eyre!("chain {chain_id} not in registry"))?;

        if dex.is_v3() {
            if chain.v3_quoter.is_zero() {
                return Ok(U256::ZERO);
            }
            Ok(self
                .quote_v3(chain_id, chain.v3_quoter, token_in, token_out, amount_in)
                .await)
        } else {
            let Some(router) = chain.router(dex).filter(|r| !r.is_zero()) else {
                return Ok(U256::ZERO);
            };
            Ok(self
                .quote_v2(chain_id, router, token_in, token_out, amount_in)
                .await)
        }
    }
}

// ============================================
// LIQUIDITY ORACLE
// ============================================

pub struct RpcLiquidityOracle {
    registry: Arc<ChainRegistry>,
    call_timeout: Duration,
}

impl RpcLiquidityOracle {
    pub fn new(registry: Arc<ChainRegistry>, call_timeout: Duration) -> Self {
        Self {
            registry,
            call_timeout,
        }
    }
}

#[async_trait]
impl LiquidityOracle for RpcLiquidityOracle {
    async fn vault_balance(
        &self,
        chain_id: u64,
        token: Address,
        vault: Address,
    ) -> Result<U256> {
        let data = IERC20::balanceOfCall { account: vault }.abi_encode();
        let raw = eth_call(&self.registry, chain_id, token, data.into(), self.call_timeout).await?;
        IERC20::balanceOfCall::abi_decode_returns(&raw).map_err(Into::into)
    }
}
