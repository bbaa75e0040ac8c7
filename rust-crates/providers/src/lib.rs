use anyhow::{
    Context,
    Result,
    anyhow,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::{
    fmt,
    fs,
    path::{
        Path,
        PathBuf,
    },
};

pub const PROVIDERS_ROOT: &str = ".providers";
const PROVIDERS_FILE: &str = "providers.json";

pub const FLOW_PROVIDER_ID: &str = "flow";
pub const BASE_PROVIDER_ID: &str = "base";

/// Width of the integer arguments the oracle contract was compiled with.
/// The function selectors differ, so the client has to pick the right binding.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OracleAbi {
    Uint64,
    Uint256,
}

impl fmt::Display for OracleAbi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OracleAbi::Uint64 => "uint64",
            OracleAbi::Uint256 => "uint256",
        };
        write!(f, "{name}")
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ProviderEntry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub chain_name: String,
    pub chain_id: u64,
    pub contract_address: String,
    pub rpc_url: String,
    #[serde(default)]
    pub block_explorer_url: Option<String>,
    pub abi: OracleAbi,
    pub currency_symbol: String,
    #[serde(default)]
    pub pack_battles_address: Option<String>,
    #[serde(default)]
    pub pack_opening_address: Option<String>,
}

impl ProviderEntry {
    pub fn explorer_address_url(&self, address: &str) -> Option<String> {
        self.block_explorer_url.as_ref().map(|base| {
            format!("{}/address/{}", base.trim_end_matches('/'), address)
        })
    }
}

pub fn builtin_providers() -> Vec<ProviderEntry> {
    vec![
        ProviderEntry {
            id: FLOW_PROVIDER_ID.to_string(),
            name: "Default Random".to_string(),
            description: "Flow's native Verifiable Random Function for on-chain randomness"
                .to_string(),
            chain_name: "Flow Testnet".to_string(),
            chain_id: 545,
            contract_address: "0x91502a85Ad74ba94499145477dccA19b3E1D6124".to_string(),
            rpc_url: "https://testnet.evm.nodes.onflow.org".to_string(),
            block_explorer_url: Some("https://evm-testnet.flowscan.io".to_string()),
            abi: OracleAbi::Uint64,
            currency_symbol: "FLOW".to_string(),
            pack_battles_address: Some(
                "0x9b4568cE546c1c54f15720783FE1744C20fF1914".to_string(),
            ),
            pack_opening_address: None,
        },
        ProviderEntry {
            id: BASE_PROVIDER_ID.to_string(),
            name: "Base VRF".to_string(),
            description: "Base's Verifiable Random Function for transparent randomness"
                .to_string(),
            chain_name: "Base Goerli Testnet".to_string(),
            chain_id: 84531,
            contract_address: "0x8778be7Dd87De3752D1C64F558691d8c8dc52aeA".to_string(),
            rpc_url: "https://goerli.base.org".to_string(),
            block_explorer_url: Some("https://goerli.basescan.org".to_string()),
            abi: OracleAbi::Uint256,
            currency_symbol: "ETH".to_string(),
            pack_battles_address: None,
            pack_opening_address: None,
        },
    ]
}

/// Oracle endpoints the randomness client can be bound to, keyed by id.
#[derive(Clone, Debug)]
pub struct ProviderRegistry {
    entries: Vec<ProviderEntry>,
    default_id: String,
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl ProviderRegistry {
    pub fn builtin() -> Self {
        Self {
            entries: builtin_providers(),
            default_id: FLOW_PROVIDER_ID.to_string(),
        }
    }

    pub fn from_entries(entries: Vec<ProviderEntry>) -> Result<Self> {
        let default_id = entries
            .first()
            .map(|entry| entry.id.clone())
            .ok_or_else(|| anyhow!("provider registry needs at least one entry"))?;
        let mut registry = Self {
            entries: Vec::new(),
            default_id,
        };
        for entry in entries {
            registry.upsert(entry);
        }
        Ok(registry)
    }

    pub fn entries(&self) -> &[ProviderEntry] {
        &self.entries
    }

    pub fn get(&self, id: &str) -> Option<&ProviderEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    pub fn default_entry(&self) -> &ProviderEntry {
        self.get(&self.default_id)
            .or_else(|| self.entries.first())
            .expect("registry is never empty")
    }

    /// Replaces the entry with the same id or appends a new one.
    pub fn upsert(&mut self, entry: ProviderEntry) {
        match self.entries.iter_mut().find(|existing| existing.id == entry.id) {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }

    /// The entry following `id`, wrapping around. Unknown ids yield the first entry.
    pub fn next_after(&self, id: &str) -> &ProviderEntry {
        let position = self.entries.iter().position(|entry| entry.id == id);
        let next = match position {
            Some(index) => (index + 1) % self.entries.len(),
            None => 0,
        };
        &self.entries[next]
    }
}

#[derive(Debug)]
pub struct ProviderStore {
    path: PathBuf,
}

impl ProviderStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn default_location() -> Self {
        Self::new(Path::new(PROVIDERS_ROOT).join(PROVIDERS_FILE))
    }

    /// Expands `~` in a user supplied path before opening the store.
    pub fn from_user_path(raw: &str) -> Self {
        let expanded = shellexpand::tilde(raw);
        Self::new(PathBuf::from(expanded.into_owned()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Vec<ProviderEntry>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        read_entries(&self.path)
    }

    pub fn save(&self, entries: &[ProviderEntry]) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create provider directory {}", parent.display())
            })?;
        }
        let json = serde_json::to_vec_pretty(entries)
            .context("Failed to serialize provider entries")?;
        fs::write(&self.path, json).context("Failed to write provider entries")?;
        Ok(())
    }
}

/// Built-in providers overlaid with whatever the store file adds or overrides.
pub fn load_registry(store: &ProviderStore) -> Result<ProviderRegistry> {
    let mut registry = ProviderRegistry::builtin();
    let custom = store
        .load()
        .with_context(|| format!("loading providers from {}", store.path().display()))?;
    for entry in custom {
        tracing::info!("Registering oracle provider '{}' from store", entry.id);
        registry.upsert(entry);
    }
    Ok(registry)
}

fn read_entries(path: impl AsRef<Path>) -> Result<Vec<ProviderEntry>> {
    let data = fs::read(path.as_ref()).context("Failed to read provider entries")?;
    if data.is_empty() || data.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    if let Ok(entries) = serde_json::from_slice::<Vec<ProviderEntry>>(&data) {
        return Ok(entries);
    }
    if let Ok(entry) = serde_json::from_slice::<ProviderEntry>(&data) {
        return Ok(vec![entry]);
    }
    Err(anyhow!(
        "Failed to parse provider JSON; expected a provider object or a list of them"
    ))
}
