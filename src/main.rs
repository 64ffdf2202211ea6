//! textcrypt - Text encryption service
//!
//! Usage:
//!   textcrypt encrypt --method <scheme> <text>  - Encrypt text
//!   textcrypt decrypt --method <scheme> <text>  - Decrypt text
//!   textcrypt serve                             - Answer JSON requests on stdin/stdout
//!
//! The symmetric passphrase is read from the ENCRYPTION_KEY environment variable.

use clap::{Parser, Subcommand};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use textcrypt::{config::Config, session, EncryptionService, Error, Result};
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "textcrypt")]
#[command(author = "textcrypt Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Encrypt and decrypt text with a passphrase or an RSA key pair")]
struct Cli {
    /// Configuration file path (optional)
    #[arg(short, long, default_value = "~/.config/textcrypt/config.json")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encrypt text
    Encrypt {
        /// Scheme: symmetric (aes) or asymmetric (rsa)
        #[arg(short, long, default_value = "symmetric")]
        method: String,

        /// Text to encrypt, or "-" to read stdin
        text: String,
    },

    /// Decrypt text
    Decrypt {
        /// Scheme: symmetric (aes) or asymmetric (rsa)
        #[arg(short, long, default_value = "symmetric")]
        method: String,

        /// Envelope or base64 ciphertext, or "-" to read stdin
        text: String,
    },

    /// Serve line-delimited JSON requests on stdin/stdout
    Serve,
}

fn main() {
    let cli = Cli::parse();

    // Expand ~ in config path
    let config_path = expand_tilde(&cli.config);

    let config = match Config::load_or_env(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        config.logging.level().unwrap_or(Level::INFO)
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set subscriber");

    // Run the command
    if let Err(e) = run_command(cli.command, &config) {
        error!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run_command(command: Commands, config: &Config) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new().map_err(|e| Error::Internal(e.to_string()))?;

    // Key pair generation failure stops every command
    let service = EncryptionService::new(config)?;

    match command {
        Commands::Encrypt { method, text } => {
            let text = read_text(text)?;
            let encrypted = runtime.block_on(service.encrypt(&text, &method))?;
            println!("{}", encrypted);
            Ok(())
        }

        Commands::Decrypt { method, text } => {
            let text = read_text(text)?;
            let decrypted = runtime.block_on(service.decrypt(&text, &method))?;
            println!("{}", decrypted);
            Ok(())
        }

        Commands::Serve => cmd_serve(&runtime, service),
    }
}

fn cmd_serve(runtime: &tokio::runtime::Runtime, service: EncryptionService) -> Result<()> {
    info!("Serving requests on stdin, one JSON object per line");

    runtime.block_on(async {
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        session::run(Arc::new(service), stdin, stdout).await?;
        Ok::<(), Error>(())
    })
}

/// Take text from the argument, or from stdin when it is "-"
fn read_text(text: String) -> Result<String> {
    if text != "-" {
        return Ok(text);
    }

    let mut buf = String::new();
    std::io::stdin().read_to_string(&mut buf)?;
    Ok(buf.trim_end_matches(['\r', '\n']).to_string())
}

fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}
