use alloy::{
    network::EthereumWallet,
    primitives::Address,
    signers::local::PrivateKeySigner,
};
use color_eyre::eyre::{
    Result,
    WrapErr,
    eyre,
};
use eth_keystore::decrypt_key;
use randomness::Error;
use rpassword::prompt_password;
use std::{
    fs,
    path::{
        Path,
        PathBuf,
    },
};

const KEYSTORE_EXTENSION: &str = "json";

#[derive(Clone, Debug)]
pub struct WalletDescriptor {
    pub name: String,
    pub path: PathBuf,
}

impl WalletDescriptor {
    pub fn new(name: impl Into<String>, path: PathBuf) -> Self {
        Self {
            name: name.into(),
            path,
        }
    }
}

/// A keystore that has been decrypted for signing.
#[derive(Clone, Debug)]
pub struct UnlockedWallet {
    pub name: String,
    pub address: Address,
    pub wallet: EthereumWallet,
}

pub fn default_wallet_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").wrap_err("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".randomness").join("keystores"))
}

pub fn resolve_wallet_dir(dir: Option<&str>) -> Result<PathBuf> {
    match dir {
        Some(raw) => {
            let expanded = shellexpand::tilde(raw);
            Ok(PathBuf::from(expanded.into_owned()))
        }
        None => default_wallet_dir(),
    }
}

pub fn list_wallets(dir: &Path) -> Result<Vec<WalletDescriptor>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut wallets = Vec::new();
    for entry in fs::read_dir(dir).wrap_err("Failed to read wallet directory")? {
        let entry = entry.wrap_err("Failed to read wallet entry")?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if path.extension().and_then(|ext| ext.to_str()) != Some(KEYSTORE_EXTENSION) {
            continue;
        }
        let name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| eyre!("Invalid wallet filename {:?}", path))?
            .to_owned();
        wallets.push(WalletDescriptor::new(name, path));
    }
    wallets.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(wallets)
}

pub fn find_wallet(dir: &Path, name: &str) -> Result<WalletDescriptor> {
    let wallets = list_wallets(dir)?;
    wallets
        .into_iter()
        .find(|w| w.name == name)
        .ok_or_else(|| eyre!("Wallet '{name}' not found in {}", dir.to_string_lossy()))
}

/// Prompts for the keystore password and decrypts the signing key.
pub fn unlock_wallet(descriptor: &WalletDescriptor) -> Result<UnlockedWallet> {
    let prompt = format!("Enter password for wallet '{}': ", descriptor.name);
    let password = prompt_password(prompt).wrap_err("Failed to read wallet password")?;
    unlock_with_password(descriptor, &password)
}

pub fn unlock_with_password(
    descriptor: &WalletDescriptor,
    password: &str,
) -> Result<UnlockedWallet> {
    let secret = decrypt_key(&descriptor.path, password.as_bytes()).map_err(|_| {
        Error::Wallet(format!("Invalid password for wallet '{}'", descriptor.name))
    })?;

    let signer = PrivateKeySigner::from_slice(&secret).map_err(|_| {
        Error::Wallet(format!(
            "Wallet '{}' contained unsupported key material",
            descriptor.name
        ))
    })?;
    let address = signer.address();
    tracing::info!("Unlocked wallet '{}' ({address})", descriptor.name);
    Ok(UnlockedWallet {
        name: descriptor.name.clone(),
        address,
        wallet: EthereumWallet::from(signer),
    })
}
