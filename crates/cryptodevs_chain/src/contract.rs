use std::sync::Arc;

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{SolCall, sol};
use tracing::{debug, info};

use crate::eth::{self, PendingTransaction, TransactionRequest};
use crate::rpc::{Eip1193Provider, RpcError};

sol! {
    /// Call interface of the deployed Crypto Devs collection.
    #[allow(missing_docs)]
    contract CryptoDevs {
        constructor(string baseURI, address whitelistContract);

        function presaleMint() external payable;
        function mint() external payable;
        function startPresale() external;

        function presaleStarted() external view returns (bool);
        function presaleEnded() external view returns (uint256);
        function owner() external view returns (address);
        function tokenIds() external view returns (uint256);
    }
}

/// Client for one deployed CryptoDevs instance.
///
/// Reads go through `eth_call`; writes are submitted to the wallet with
/// `eth_sendTransaction` and return a [`PendingTransaction`].
#[derive(Clone)]
pub struct CryptoDevsContract {
    address: Address,
    provider: Arc<dyn Eip1193Provider>,
}

impl CryptoDevsContract {
    pub fn new(address: Address, provider: Arc<dyn Eip1193Provider>) -> Self {
        Self { address, provider }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    async fn read<C: SolCall>(&self, call: C) -> Result<C::Return, RpcError> {
        let data = eth::call(self.provider.as_ref(), self.address, call.abi_encode().into()).await?;
        C::abi_decode_returns(&data, true)
            .map_err(|e| RpcError::Decode(format!("{}: {e}", C::SIGNATURE)))
    }

    async fn write<C: SolCall>(
        &self,
        from: Address,
        call: C,
        value: Option<U256>,
    ) -> Result<PendingTransaction, RpcError> {
        let tx = TransactionRequest {
            from,
            to: Some(self.address),
            data: Bytes::from(call.abi_encode()),
            value,
        };
        let hash = eth::send_transaction(self.provider.as_ref(), &tx).await?;
        info!(method = C::SIGNATURE, tx = %hash, %from, "transaction submitted");
        Ok(PendingTransaction::new(hash, Arc::clone(&self.provider)))
    }

    pub async fn presale_started(&self) -> Result<bool, RpcError> {
        let started = self.read(CryptoDevs::presaleStartedCall {}).await?._0;
        debug!(started, "presaleStarted()");
        Ok(started)
    }

    /// Unix timestamp (seconds) at which the presale closes.
    pub async fn presale_ended(&self) -> Result<U256, RpcError> {
        Ok(self.read(CryptoDevs::presaleEndedCall {}).await?._0)
    }

    pub async fn owner(&self) -> Result<Address, RpcError> {
        Ok(self.read(CryptoDevs::ownerCall {}).await?._0)
    }

    /// Number of tokens minted so far.
    pub async fn token_ids(&self) -> Result<U256, RpcError> {
        Ok(self.read(CryptoDevs::tokenIdsCall {}).await?._0)
    }

    pub async fn presale_mint(
        &self,
        from: Address,
        value: U256,
    ) -> Result<PendingTransaction, RpcError> {
        self.write(from, CryptoDevs::presaleMintCall {}, Some(value))
            .await
    }

    pub async fn mint(&self, from: Address, value: U256) -> Result<PendingTransaction, RpcError> {
        self.write(from, CryptoDevs::mintCall {}, Some(value)).await
    }

    pub async fn start_presale(&self, from: Address) -> Result<PendingTransaction, RpcError> {
        self.write(from, CryptoDevs::startPresaleCall {}, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockWallet;

    fn contract(wallet: &Arc<MockWallet>) -> CryptoDevsContract {
        CryptoDevsContract::new(MockWallet::CONTRACT, wallet.clone())
    }

    #[test]
    fn selectors_match_solidity_signatures() {
        assert_eq!(CryptoDevs::mintCall::SIGNATURE, "mint()");
        assert_eq!(CryptoDevs::mintCall::SELECTOR, [0x12, 0x49, 0xc5, 0x8b]);
        assert_eq!(CryptoDevs::ownerCall::SELECTOR, [0x8d, 0xa5, 0xcb, 0x5b]);
    }

    #[tokio::test]
    async fn reads_decode_contract_state() {
        let wallet = Arc::new(MockWallet::new());
        wallet.set_presale(true, U256::from(1_700_000_000u64));
        wallet.set_token_ids(7);
        let owner = Address::repeat_byte(0x42);
        wallet.set_owner(owner);

        let c = contract(&wallet);
        assert!(c.presale_started().await.unwrap());
        assert_eq!(c.presale_ended().await.unwrap(), U256::from(1_700_000_000u64));
        assert_eq!(c.owner().await.unwrap(), owner);
        assert_eq!(c.token_ids().await.unwrap(), U256::from(7u64));
    }

    #[tokio::test]
    async fn failed_read_surfaces_rpc_error() {
        let wallet = Arc::new(MockWallet::new());
        wallet.fail_method("eth_call");

        let err = contract(&wallet).token_ids().await.unwrap_err();
        assert!(matches!(err, RpcError::Rpc { .. }));
    }

    #[tokio::test]
    async fn mint_sends_value_and_calldata() {
        let wallet = Arc::new(MockWallet::new());
        let price = U256::from(10_000_000_000_000_000u64);

        contract(&wallet)
            .mint(wallet.account(), price)
            .await
            .unwrap();

        let sent = wallet.sent_transactions();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, Some(MockWallet::CONTRACT));
        assert_eq!(sent[0].value, Some(price));
        assert_eq!(&sent[0].data[..], CryptoDevs::mintCall::SELECTOR.as_slice());
    }

    #[tokio::test]
    async fn start_presale_carries_no_value() {
        let wallet = Arc::new(MockWallet::new());
        contract(&wallet)
            .start_presale(wallet.account())
            .await
            .unwrap();

        let sent = wallet.sent_transactions();
        assert_eq!(sent[0].value, None);
        assert_eq!(
            &sent[0].data[..],
            CryptoDevs::startPresaleCall::SELECTOR.as_slice()
        );
    }
}
