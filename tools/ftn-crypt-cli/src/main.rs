//! # ftn-crypt
//!
//! Encrypts and decrypts netmail for FidoNet nodes that advertise a
//! `CRYPT:<method>` flag in the node directory.
//!
//! ```text
//! ftn-crypt --directory nodes.json encrypt --address 2:5020/1042 < msg.txt > msg.enc
//! FTN_CRYPT_PASSPHRASE=... ftn-crypt --directory nodes.json decrypt --address 2:5020/1042 -i msg.enc
//! ftn-crypt --directory nodes.json probe --address 2:5020/1042
//! ```
//!
//! Messages use the `\r` line separator on both input and output.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, error};

use ftn_crypt::{
    CommandEngine, CommandEngineConfig, CryptConfig, FidonetFqdn, FtnAddress, JsonDirectory,
    LocalPart, MessageCryptApi, MessageCryptService, OperationResult, TagArea,
};
use ftn_telemetry::{init_logging, TelemetryConfig};

/// Optional end-to-end encryption for FidoNet netmail
#[derive(Parser, Debug)]
#[command(name = "ftn-crypt", version)]
#[command(about = "Encrypt and decrypt FidoNet netmail for capable nodes")]
struct Cli {
    /// Node directory (JSON object mapping addresses to flag lists)
    #[arg(short, long, env = "FTN_CRYPT_DIRECTORY")]
    directory: PathBuf,

    /// Per-method command table (JSON); built-in gpg/pgp commands otherwise
    #[arg(long, env = "FTN_CRYPT_COMMANDS")]
    commands: Option<PathBuf>,

    /// Destination local-part
    #[arg(long)]
    local_part: Option<String>,

    /// FQDN domain suffix
    #[arg(long)]
    domain: Option<String>,

    /// Area for the ENC marker: header or footer
    #[arg(long)]
    marker_area: Option<TagArea>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Encrypt a message body for a node
    Encrypt {
        #[command(flatten)]
        io: MessageIo,
    },

    /// Decrypt a message body received for a node
    Decrypt {
        #[command(flatten)]
        io: MessageIo,

        /// Environment variable holding the passphrase
        #[arg(long, default_value = "FTN_CRYPT_PASSPHRASE")]
        passphrase_env: String,
    },

    /// Show a node's encryption capability as JSON
    Probe {
        /// Node address, e.g. 2:5020/1042
        #[arg(short, long)]
        address: FtnAddress,
    },
}

#[derive(clap::Args, Debug)]
struct MessageIo {
    /// Node address, e.g. 2:5020/1042
    #[arg(short, long)]
    address: FtnAddress,

    /// Message file (stdin when omitted)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output file (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut telemetry = TelemetryConfig::from_env();
    if cli.verbose {
        telemetry = telemetry.with_log_level("debug");
    }
    if let Err(e) = init_logging(&telemetry) {
        eprintln!("ftn-crypt: {e}");
    }

    match run(cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            error!(error = %e, "ftn-crypt failed");
            eprintln!("ftn-crypt: {e:#}");
            ExitCode::from(2)
        }
    }
}

type Service = MessageCryptService<JsonDirectory, FidonetFqdn, CommandEngine>;

/// Returns whether the operation succeeded.
fn run(cli: Cli) -> Result<bool> {
    let config = crypt_config(&cli)?;
    let service = build_service(&cli, config)?;

    match cli.command {
        Command::Encrypt { io } => {
            let message = read_message(io.input.as_deref())?;
            let result = service.encrypt(&io.address, &message);
            finish(result, io.output.as_deref())
        }
        Command::Decrypt { io, passphrase_env } => {
            let message = read_message(io.input.as_deref())?;
            let passphrase = std::env::var(&passphrase_env).unwrap_or_default();
            let result = service.decrypt(&io.address, &message, &passphrase);
            finish(result, io.output.as_deref())
        }
        Command::Probe { address } => {
            let capability = service.capability(&address)?;
            println!("{}", serde_json::to_string_pretty(&capability)?);
            Ok(capability.is_capable())
        }
    }
}

fn crypt_config(cli: &Cli) -> Result<CryptConfig> {
    let mut config = CryptConfig::from_env().context("Invalid FTN_CRYPT_* environment")?;
    if let Some(local_part) = &cli.local_part {
        config = config.with_local_part(LocalPart::new(local_part)?);
    }
    if let Some(domain) = &cli.domain {
        config = config.with_fqdn_domain(domain.clone());
    }
    if let Some(area) = cli.marker_area {
        config = config.with_marker_area(area);
    }
    config.validate()?;
    debug!(?config, "configuration loaded");
    Ok(config)
}

fn build_service(cli: &Cli, config: CryptConfig) -> Result<Service> {
    let directory = JsonDirectory::load(&cli.directory)
        .with_context(|| format!("Failed to load directory {}", cli.directory.display()))?;

    let commands = match &cli.commands {
        Some(path) => CommandEngineConfig::load(path)?,
        None => CommandEngineConfig::default(),
    };

    let formatter = FidonetFqdn::new(config.fqdn_domain.clone());
    Ok(MessageCryptService::new(
        directory,
        formatter,
        CommandEngine::new(commands),
        config,
    ))
}

fn read_message(input: Option<&Path>) -> Result<String> {
    match input {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut message = String::new();
            io::stdin()
                .read_to_string(&mut message)
                .context("Failed to read stdin")?;
            Ok(message)
        }
    }
}

fn finish(result: OperationResult, output: Option<&Path>) -> Result<bool> {
    if !result.ok {
        eprintln!("ftn-crypt: {}", result.text_or_error);
        return Ok(false);
    }
    write_message(&result.text_or_error, output)?;
    Ok(true)
}

fn write_message(text: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(path, text).with_context(|| format!("Failed to write {}", path.display()))
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(text.as_bytes())?;
            stdout.flush()?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_decrypt() {
        let cli = Cli::try_parse_from([
            "ftn-crypt",
            "--directory",
            "nodes.json",
            "--marker-area",
            "footer",
            "decrypt",
            "--address",
            "2:5020/1042.3",
            "--passphrase-env",
            "MY_PASS",
        ])
        .unwrap();

        assert_eq!(cli.marker_area, Some(TagArea::Footer));
        match cli.command {
            Command::Decrypt { io, passphrase_env } => {
                assert_eq!(io.address, FtnAddress::new(2, 5020, 1042, 3));
                assert_eq!(passphrase_env, "MY_PASS");
                assert!(io.input.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_bad_address_is_rejected() {
        let err = Cli::try_parse_from([
            "ftn-crypt",
            "--directory",
            "nodes.json",
            "probe",
            "--address",
            "not-an-address",
        ]);
        assert!(err.is_err());
    }

    #[test]
    fn test_local_part_override() {
        let cli = Cli::try_parse_from([
            "ftn-crypt",
            "--directory",
            "nodes.json",
            "--local-part",
            "crypt.gate",
            "probe",
            "--address",
            "2:5020/1042",
        ])
        .unwrap();

        let config = crypt_config(&cli).unwrap();
        assert_eq!(config.local_part.as_str(), "crypt.gate");
    }

    #[test]
    fn test_failed_operation_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.msg");

        let ok = finish(
            OperationResult::failure(ftn_crypt::CryptError::NotEncrypted),
            Some(&out),
        )
        .unwrap();

        assert!(!ok);
        assert!(!out.exists());
    }

    #[test]
    fn test_successful_operation_writes_output() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.msg");

        let ok = finish(OperationResult::success("a\rb".to_string()), Some(&out)).unwrap();

        assert!(ok);
        assert_eq!(fs::read_to_string(&out).unwrap(), "a\rb");
    }
}
