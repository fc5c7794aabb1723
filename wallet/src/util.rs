use crate::core::{Config, FeeConfig, FeeType, Key, Recipient};
use anyhow::Result;
use std::path::{Path, PathBuf};

/// Sets up a tracing subscriber that writes to stderr, filtered by
/// `RUST_LOG` (defaults to `info`). The cursive UI owns the terminal, so
/// logs never go to stdout.
pub fn setup_tracing() -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))
}

/// Cursive leaves the terminal in raw mode if the process panics while
/// the UI is running. Reset it first so the panic message is readable.
pub fn setup_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = crossterm::terminal::disable_raw_mode();
        default_hook(info);
    }));
}

/// Renders the wallet's current balance as large ASCII-art digits for
/// the dashboard's headline display.
pub fn big_mode_btc(core: &crate::core::Core) -> String {
    let btc = core.get_balance() as f64 / 100_000_000.0;
    let label = format!("{btc:.8} BTC");
    text_to_ascii_art::to_art(label.clone(), "standard", 0, 0, 0)
        .unwrap_or(label)
}

/// Writes a starter `wallet_config.toml` an operator can hand-edit,
/// pointing at keys and contacts that do not yet exist on disk.
pub fn generate_dummy_config(output: &Path) -> Result<()> {
    let config = Config {
        my_keys: vec![Key {
            public: PathBuf::from("my_key.pub.pem"),
            private: PathBuf::from("my_key.priv.pem"),
        }],
        contacts: vec![Recipient {
            name: "alice".to_string(),
            key: PathBuf::from("alice.pub.pem"),
        }],
        default_node: "127.0.0.1:9000".to_string(),
        fee_config: FeeConfig {
            fee_type: FeeType::Fixed,
            value: 1000.0,
        },
    };

    let toml = toml::to_string_pretty(&config)?;
    std::fs::write(output, toml)?;
    Ok(())
}
