use color_eyre::eyre::{
    Result,
    WrapErr,
    eyre,
};
use randomness_tui::{
    social_client::DEFAULT_SERVER_URL,
    wallets,
};
use std::path::PathBuf;

mod client;
mod ui;

fn print_usage_and_exit() -> ! {
    println!(
        "Usage: randomness-tui [--provider <id>] [--providers-file <path>]\n\
         [--server-url <url>] [--wallet <name>] [--wallet-dir <path>] [--log-dir <path>]\n\
         \n\
         Flags:\n\
           --provider <id>          Oracle provider to start with (flow, base, or a custom id)\n\
           --providers-file <path>  Extra provider entries (defaults to .providers/providers.json)\n\
           --server-url <url>       Randomness server for social draws (default {})\n\
           --wallet <name>          Keystore used to create/join battles and open packs\n\
           --wallet-dir <path>      Keystore directory (defaults to ~/.randomness/keystores)\n\
           --log-dir <path>         Where randomness-tui.log is written (defaults to ~/.randomness/logs)",
        DEFAULT_SERVER_URL,
    );
    std::process::exit(0);
}

struct CliArgs {
    app: client::AppConfig,
    log_dir: PathBuf,
}

fn take_value(
    args: &mut impl Iterator<Item = String>,
    slot: &mut Option<String>,
    flag: &str,
    what: &str,
) -> Result<()> {
    let value = args
        .next()
        .ok_or_else(|| eyre!("{flag} requires a {what} argument"))?;
    if slot.is_some() {
        return Err(eyre!("{flag} may only be specified once"));
    }
    *slot = Some(value);
    Ok(())
}

fn parse_cli_args() -> Result<CliArgs> {
    let mut args = std::env::args().skip(1);
    let mut provider_id: Option<String> = None;
    let mut providers_file: Option<String> = None;
    let mut server_url: Option<String> = None;
    let mut wallet_name: Option<String> = None;
    let mut wallet_dir: Option<String> = None;
    let mut log_dir: Option<String> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--provider" => take_value(&mut args, &mut provider_id, "--provider", "provider id")?,
            "--providers-file" => {
                take_value(&mut args, &mut providers_file, "--providers-file", "path")?
            }
            "--server-url" => take_value(&mut args, &mut server_url, "--server-url", "URL")?,
            "--wallet" => take_value(&mut args, &mut wallet_name, "--wallet", "wallet name")?,
            "--wallet-dir" => take_value(&mut args, &mut wallet_dir, "--wallet-dir", "path")?,
            "--log-dir" => take_value(&mut args, &mut log_dir, "--log-dir", "path")?,
            "--help" | "-h" => print_usage_and_exit(),
            other => return Err(eyre!("Unknown argument: {other}")),
        }
    }

    if wallet_dir.is_some() && wallet_name.is_none() {
        return Err(eyre!("--wallet-dir has no effect without --wallet <name>"));
    }
    let wallet = match wallet_name {
        Some(name) => Some(client::WalletConfig {
            name,
            dir: wallets::resolve_wallet_dir(wallet_dir.as_deref())?,
        }),
        None => None,
    };

    let log_dir = match log_dir {
        Some(raw) => PathBuf::from(shellexpand::tilde(&raw).into_owned()),
        None => {
            let home = std::env::var("HOME").wrap_err("HOME environment variable not set")?;
            PathBuf::from(home).join(".randomness").join("logs")
        }
    };

    Ok(CliArgs {
        app: client::AppConfig {
            provider_id,
            providers_file,
            server_url: server_url.unwrap_or_else(|| DEFAULT_SERVER_URL.to_string()),
            wallet,
        },
        log_dir,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = parse_cli_args()?;
    let _guard = client::init_tracing(&cli.log_dir)?;
    tracing::info!("starting randomness-tui");
    client::run_app(cli.app).await
}
