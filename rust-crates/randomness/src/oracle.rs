use crate::{
    Error,
    Result,
};
use alloy::{
    primitives::U256,
    providers::{
        DynProvider,
        Provider,
        ProviderBuilder,
    },
};
use generated_abi::{
    base_vrf_types,
    flow_vrf_types,
    parse_address,
};
use providers::{
    OracleAbi,
    ProviderEntry,
    ProviderRegistry,
};
use url::Url;

/// Source of verifiable randomness.
pub trait RandomnessOracle {
    /// A number in the inclusive range `[min, max]`. Requires `min < max`.
    fn random_in_range(&mut self, min: u64, max: u64) -> impl Future<Output = Result<u64>>;

    /// One of `items`. Requires a non-empty list.
    fn random_pick(&mut self, items: &[String]) -> impl Future<Output = Result<String>>;
}

type FlowOracle = flow_vrf_types::RandomnessOracle::RandomnessOracleInstance<DynProvider>;
type BaseOracle = base_vrf_types::RandomnessOracle::RandomnessOracleInstance<DynProvider>;

enum OracleBinding {
    Flow(FlowOracle),
    Base(BaseOracle),
}

/// Read-only client for the oracle contract of the selected registry entry.
/// The RPC connection is opened on first use and dropped on rebinding.
pub struct RandomnessClient {
    registry: ProviderRegistry,
    selected: String,
    connection: Option<OracleBinding>,
}

impl RandomnessClient {
    pub fn new(registry: ProviderRegistry) -> Self {
        let selected = registry.default_entry().id.clone();
        Self {
            registry,
            selected,
            connection: None,
        }
    }

    pub fn with_provider(registry: ProviderRegistry, id: &str) -> Result<Self> {
        let mut client = Self::new(registry);
        client.select_provider(id)?;
        Ok(client)
    }

    pub fn provider(&self) -> &ProviderEntry {
        self.registry
            .get(&self.selected)
            .unwrap_or_else(|| self.registry.default_entry())
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub fn select_provider(&mut self, id: &str) -> Result<&ProviderEntry> {
        if self.registry.get(id).is_none() {
            return Err(Error::UnknownProvider(id.to_string()));
        }
        if self.selected != id {
            tracing::info!("switching oracle provider {} -> {}", self.selected, id);
            self.selected = id.to_string();
            self.connection = None;
        }
        Ok(self.provider())
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    fn connection(&mut self) -> Result<&OracleBinding> {
        if self.connection.is_none() {
            let binding = connect(self.provider())?;
            self.connection = Some(binding);
        }
        self.connection
            .as_ref()
            .ok_or_else(|| Error::Configuration("oracle connection unavailable".to_string()))
    }
}

fn connect(entry: &ProviderEntry) -> Result<OracleBinding> {
    let rpc_url: Url = entry.rpc_url.parse().map_err(|e| {
        Error::Configuration(format!("invalid RPC URL '{}': {e}", entry.rpc_url))
    })?;
    let address = parse_address(&entry.contract_address).map_err(Error::Configuration)?;
    tracing::debug!(
        "connecting to {} oracle {} via {}",
        entry.abi,
        address,
        rpc_url
    );
    let provider = ProviderBuilder::new().connect_http(rpc_url).erased();
    let binding = match entry.abi {
        OracleAbi::Uint64 => {
            OracleBinding::Flow(flow_vrf_types::RandomnessOracle::new(address, provider))
        }
        OracleAbi::Uint256 => {
            OracleBinding::Base(base_vrf_types::RandomnessOracle::new(address, provider))
        }
    };
    Ok(binding)
}

impl RandomnessOracle for RandomnessClient {
    async fn random_in_range(&mut self, min: u64, max: u64) -> Result<u64> {
        if min >= max {
            return Err(Error::InvalidRange { min, max });
        }
        let value = match self.connection()? {
            OracleBinding::Flow(oracle) => oracle
                .getRandomNumber(min, max)
                .call()
                .await
                .map_err(Error::contract)?,
            OracleBinding::Base(oracle) => {
                let wide = oracle
                    .getRandomNumber(U256::from(min), U256::from(max))
                    .call()
                    .await
                    .map_err(Error::contract)?;
                u256_to_u64(wide)?
            }
        };
        if value < min || value > max {
            return Err(Error::Contract(format!(
                "oracle returned {value}, outside [{min}, {max}]"
            )));
        }
        tracing::debug!("oracle drew {value} in [{min}, {max}]");
        Ok(value)
    }

    async fn random_pick(&mut self, items: &[String]) -> Result<String> {
        match items {
            [] => Err(Error::EmptyList),
            [only] => Ok(only.clone()),
            _ => {
                let picked = match self.connection()? {
                    OracleBinding::Flow(oracle) => oracle
                        .selectRandomItem(items.to_vec())
                        .call()
                        .await
                        .map_err(Error::contract)?,
                    OracleBinding::Base(oracle) => oracle
                        .selectRandomItem(items.to_vec())
                        .call()
                        .await
                        .map_err(Error::contract)?,
                };
                tracing::debug!("oracle picked '{picked}' from {} items", items.len());
                Ok(picked)
            }
        }
    }
}

pub(crate) fn u256_to_u64(value: U256) -> Result<u64> {
    if value > U256::from(u64::MAX) {
        return Err(Error::Contract(format!("value {value} does not fit in u64")));
    }
    Ok(value.to::<u64>())
}

#[allow(non_snake_case)]
#[cfg(test)]
mod tests {
    use super::*;
    use providers::BASE_PROVIDER_ID;

    #[tokio::test]
    async fn random_in_range__equal_bounds_is_invalid_range() {
        // given
        let mut client = RandomnessClient::new(ProviderRegistry::builtin());

        // when
        let result = client.random_in_range(5, 5).await;

        // then
        assert!(matches!(result, Err(Error::InvalidRange { min: 5, max: 5 })));
        assert!(!client.is_connected());
    }

    #[tokio::test]
    async fn random_pick__empty_list_is_rejected() {
        // given
        let mut client = RandomnessClient::new(ProviderRegistry::builtin());

        // when
        let result = client.random_pick(&[]).await;

        // then
        assert!(matches!(result, Err(Error::EmptyList)));
    }

    #[tokio::test]
    async fn random_pick__single_item_returns_without_connecting() {
        // given
        let mut client = RandomnessClient::new(ProviderRegistry::builtin());

        // when
        let picked = client.random_pick(&["only".to_string()]).await.unwrap();

        // then
        assert_eq!(picked, "only");
        assert!(!client.is_connected());
    }

    #[test]
    fn select_provider__unknown_id_is_rejected() {
        // given
        let mut client = RandomnessClient::new(ProviderRegistry::builtin());

        // when
        let result = client.select_provider("nope");

        // then
        assert!(matches!(result, Err(Error::UnknownProvider(id)) if id == "nope"));
        assert_eq!(client.provider().id, "flow");
    }

    #[test]
    fn select_provider__drops_cached_connection() {
        // given
        let mut client = RandomnessClient::new(ProviderRegistry::builtin());
        client.connection().unwrap();
        assert!(client.is_connected());

        // when
        let entry = client.select_provider(BASE_PROVIDER_ID).unwrap();

        // then
        assert_eq!(entry.abi, OracleAbi::Uint256);
        assert!(!client.is_connected());
    }

    #[test]
    fn connection__bad_contract_address_is_configuration_error() {
        // given
        let mut entry = ProviderRegistry::builtin().default_entry().clone();
        entry.id = "broken".to_string();
        entry.contract_address = "0x12".to_string();
        let registry = ProviderRegistry::from_entries(vec![entry]).unwrap();
        let mut client = RandomnessClient::new(registry);

        // when
        let result = client.connection().map(|_| ());

        // then
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn u256_to_u64__rejects_overflow() {
        // given
        let wide = U256::from(u64::MAX) + U256::from(1u8);

        // when
        let result = u256_to_u64(wide);

        // then
        assert!(matches!(result, Err(Error::Contract(_))));
    }
}
