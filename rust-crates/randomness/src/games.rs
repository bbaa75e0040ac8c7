use crate::{
    Error,
    Result,
    oracle::{
        RandomnessOracle,
        u256_to_u64,
    },
};
use alloy::{
    network::EthereumWallet,
    primitives::{
        Address,
        U256,
    },
    providers::{
        DynProvider,
        Provider,
        ProviderBuilder,
    },
    rpc::types::TransactionReceipt,
    sol_types::SolEvent,
};
use generated_abi::{
    pack_battles_types::PackBattles,
    pack_opening_types::PackOpening,
    parse_address,
};
use providers::ProviderEntry;
use url::Url;

/// Read-only provider for the entry's chain.
pub fn read_provider(entry: &ProviderEntry) -> Result<DynProvider> {
    let url = rpc_url(entry)?;
    Ok(ProviderBuilder::new().connect_http(url).erased())
}

/// Provider that signs and sends transactions with `wallet`.
pub fn signing_provider(entry: &ProviderEntry, wallet: EthereumWallet) -> Result<DynProvider> {
    let url = rpc_url(entry)?;
    Ok(ProviderBuilder::new().wallet(wallet).connect_http(url).erased())
}

fn rpc_url(entry: &ProviderEntry) -> Result<Url> {
    entry.rpc_url.parse().map_err(|e| {
        Error::Configuration(format!("invalid RPC URL '{}': {e}", entry.rpc_url))
    })
}

fn contract_address(raw: Option<&String>, what: &str, entry: &ProviderEntry) -> Result<Address> {
    let raw = raw.ok_or_else(|| {
        Error::Configuration(format!("no {what} contract configured for {}", entry.name))
    })?;
    parse_address(raw).map_err(Error::Configuration)
}

fn decode_event<E: SolEvent>(receipt: &TransactionReceipt) -> Option<E> {
    receipt
        .inner
        .logs()
        .iter()
        .find_map(|log| log.log_decode::<E>().ok())
        .map(|decoded| decoded.inner.data)
}

fn ensure_success(receipt: &TransactionReceipt, action: &str) -> Result<()> {
    if receipt.status() {
        Ok(())
    } else {
        Err(Error::Contract(format!(
            "{action} transaction {} reverted",
            receipt.transaction_hash
        )))
    }
}

/// A pack battle as stored on chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameRecord {
    pub id: u64,
    pub creator: Address,
    pub player: Address,
    pub active: bool,
    pub completed: bool,
    pub creator_nft_index: u64,
    pub player_nft_index: u64,
}

impl GameRecord {
    fn from_chain(id: u64, game: PackBattles::Game) -> Result<Self> {
        Ok(Self {
            id,
            creator: game.creator,
            player: game.player,
            active: game.isActive,
            completed: game.isCompleted,
            creator_nft_index: u256_to_u64(game.creatorNFTIndex)?,
            player_nft_index: u256_to_u64(game.playerNFTIndex)?,
        })
    }

    /// Waiting for a second player.
    pub fn is_open(&self) -> bool {
        self.active && !self.completed && self.player == Address::ZERO
    }

    /// The higher NFT index wins; a tie goes to the player.
    pub fn winner(&self) -> Option<Address> {
        if !self.completed {
            return None;
        }
        if self.creator_nft_index > self.player_nft_index {
            Some(self.creator)
        } else {
            Some(self.player)
        }
    }

    pub fn involves(&self, account: Address) -> bool {
        self.creator == account || self.player == account
    }
}

pub struct PackBattlesClient {
    contract: PackBattles::PackBattlesInstance<DynProvider>,
}

impl PackBattlesClient {
    pub fn new(address: Address, provider: DynProvider) -> Self {
        Self {
            contract: PackBattles::new(address, provider),
        }
    }

    pub fn from_entry(entry: &ProviderEntry, provider: DynProvider) -> Result<Self> {
        let address =
            contract_address(entry.pack_battles_address.as_ref(), "pack battles", entry)?;
        Ok(Self::new(address, provider))
    }

    pub async fn game_fee(&self) -> Result<U256> {
        self.contract.GAME_FEE().call().await.map_err(Error::contract)
    }

    /// Creates a game, paying the game fee. Returns the new game id.
    pub async fn create_game(&self) -> Result<u64> {
        let fee = self.game_fee().await?;
        tracing::info!("creating pack battle (fee {fee} wei)");
        let receipt = self
            .contract
            .createGame()
            .value(fee)
            .send()
            .await
            .map_err(Error::contract)?
            .get_receipt()
            .await
            .map_err(Error::contract)?;
        ensure_success(&receipt, "createGame")?;
        let created = decode_event::<PackBattles::GameCreated>(&receipt).ok_or_else(|| {
            Error::Contract("createGame receipt carries no GameCreated event".to_string())
        })?;
        let id = u256_to_u64(created.gameId)?;
        tracing::info!("created pack battle #{id}");
        Ok(id)
    }

    pub async fn join_game(&self, id: u64) -> Result<()> {
        let fee = self.game_fee().await?;
        tracing::info!("joining pack battle #{id} (fee {fee} wei)");
        let receipt = self
            .contract
            .joinGame(U256::from(id))
            .value(fee)
            .send()
            .await
            .map_err(Error::contract)?
            .get_receipt()
            .await
            .map_err(Error::contract)?;
        ensure_success(&receipt, "joinGame")?;
        if let Some(completed) = decode_event::<PackBattles::GameCompleted>(&receipt) {
            tracing::info!(
                "pack battle #{id} completed, winner {}",
                completed.winner
            );
        }
        Ok(())
    }

    pub async fn game(&self, id: u64) -> Result<GameRecord> {
        let game = self
            .contract
            .getGame(U256::from(id))
            .call()
            .await
            .map_err(Error::contract)?;
        GameRecord::from_chain(id, game)
    }

    /// Every game created so far. Ids run from 1 to the game counter.
    pub async fn games(&self) -> Result<Vec<GameRecord>> {
        let counter = self
            .contract
            .gameCounter()
            .call()
            .await
            .map_err(Error::contract)?;
        let counter = u256_to_u64(counter)?;
        let mut games = Vec::new();
        for id in 1..=counter {
            games.push(self.game(id).await?);
        }
        Ok(games)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OpenedPack {
    pub round: u64,
    pub token_id: u64,
}

pub struct PackOpeningClient {
    contract: PackOpening::PackOpeningInstance<DynProvider>,
}

impl PackOpeningClient {
    pub fn new(address: Address, provider: DynProvider) -> Self {
        Self {
            contract: PackOpening::new(address, provider),
        }
    }

    pub fn from_entry(entry: &ProviderEntry, provider: DynProvider) -> Result<Self> {
        let address =
            contract_address(entry.pack_opening_address.as_ref(), "pack opening", entry)?;
        Ok(Self::new(address, provider))
    }

    pub async fn pack_cost(&self) -> Result<U256> {
        self.contract.PACK_COST().call().await.map_err(Error::contract)
    }

    pub async fn available_nfts(&self) -> Result<u64> {
        let count = self
            .contract
            .getAvailableNFTCount()
            .call()
            .await
            .map_err(Error::contract)?;
        u256_to_u64(count)
    }

    pub async fn open_pack(&self) -> Result<OpenedPack> {
        let cost = self.pack_cost().await?;
        let receipt = self
            .contract
            .openPack()
            .value(cost)
            .send()
            .await
            .map_err(Error::contract)?
            .get_receipt()
            .await
            .map_err(Error::contract)?;
        ensure_success(&receipt, "openPack")?;
        let opened = decode_event::<PackOpening::PackOpened>(&receipt).ok_or_else(|| {
            Error::Contract("openPack receipt carries no PackOpened event".to_string())
        })?;
        let pack = OpenedPack {
            round: u256_to_u64(opened.round)?,
            token_id: u256_to_u64(opened.tokenId)?,
        };
        tracing::info!("opened pack: round {} token #{}", pack.round, pack.token_id);
        Ok(pack)
    }
}

pub const YOLO_MIN: u64 = 1;
pub const YOLO_MAX: u64 = 100;
const YOLO_THRESHOLD: u64 = 50;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct YoloVerdict {
    pub roll: u64,
}

impl YoloVerdict {
    pub fn is_yolo(&self) -> bool {
        self.roll > YOLO_THRESHOLD
    }

    pub fn label(&self) -> &'static str {
        if self.is_yolo() { "YOLO!" } else { "NO WAY!" }
    }
}

pub async fn yolo_roll<O: RandomnessOracle>(oracle: &mut O) -> Result<YoloVerdict> {
    let roll = oracle.random_in_range(YOLO_MIN, YOLO_MAX).await?;
    Ok(YoloVerdict { roll })
}
