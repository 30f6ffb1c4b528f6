//! # External Command Engine
//!
//! `CryptoEngine` implementation that runs the installed PGP/GnuPG tools.
//!
//! Input is written to the program's stdin and the result is read from its
//! stdout. A non-zero exit status becomes an `EngineError` carrying the
//! program's stderr unchanged.
//!
//! The tools accept armoured input directly, so `unarmour` hands the text
//! through as bytes.

use crate::domain::config::ConfigError;
use crate::domain::method::EncryptionMethod;
use crate::ports::outbound::{CryptoEngine, EngineError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use tracing::debug;

/// Placeholder replaced by the destination address in argument templates.
pub const RECIPIENT_PLACEHOLDER: &str = "{recipient}";

/// How a decrypt command receives the passphrase.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassphraseInput {
    /// First line of stdin, before the ciphertext
    #[default]
    Stdin,
    /// Named environment variable of the child process
    Env(String),
}

/// One external program invocation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default)]
    pub passphrase: PassphraseInput,
}

impl CommandSpec {
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            passphrase: PassphraseInput::Stdin,
        }
    }

    pub fn with_passphrase(mut self, input: PassphraseInput) -> Self {
        self.passphrase = input;
        self
    }
}

/// Encrypt and decrypt invocations for one method.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodCommands {
    pub encrypt: CommandSpec,
    pub decrypt: CommandSpec,
}

/// Command table per method.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandEngineConfig {
    pub methods: HashMap<EncryptionMethod, MethodCommands>,
}

impl Default for CommandEngineConfig {
    fn default() -> Self {
        let mut methods = HashMap::new();
        methods.insert(
            EncryptionMethod::GnuPg,
            MethodCommands {
                encrypt: CommandSpec::new(
                    "gpg",
                    &[
                        "--batch",
                        "--yes",
                        "--armor",
                        "--trust-model",
                        "always",
                        "--recipient",
                        RECIPIENT_PLACEHOLDER,
                        "--encrypt",
                    ],
                ),
                decrypt: CommandSpec::new(
                    "gpg",
                    &[
                        "--batch",
                        "--yes",
                        "--quiet",
                        "--pinentry-mode",
                        "loopback",
                        "--passphrase-fd",
                        "0",
                        "--decrypt",
                    ],
                ),
            },
        );
        methods.insert(
            EncryptionMethod::Pgp5,
            MethodCommands {
                encrypt: CommandSpec::new("pgpe", &["-a", "-f", "-r", RECIPIENT_PLACEHOLDER]),
                decrypt: CommandSpec::new("pgpv", &["-f"])
                    .with_passphrase(PassphraseInput::Env("PGPPASS".to_string())),
            },
        );
        methods.insert(
            EncryptionMethod::Pgp2,
            MethodCommands {
                encrypt: CommandSpec::new("pgp", &["-feat", RECIPIENT_PLACEHOLDER]),
                decrypt: CommandSpec::new("pgp", &["-f"])
                    .with_passphrase(PassphraseInput::Env("PGPPASS".to_string())),
            },
        );
        Self { methods }
    }
}

impl CommandEngineConfig {
    /// Load a command table from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| ConfigError::Load(format!("{}: {e}", path.display())))?;
        serde_json::from_str(&text)
            .map_err(|e| ConfigError::Load(format!("{}: {e}", path.display())))
    }
}

/// Crypto engine driving external programs.
#[derive(Clone, Debug, Default)]
pub struct CommandEngine {
    config: CommandEngineConfig,
}

impl CommandEngine {
    pub fn new(config: CommandEngineConfig) -> Self {
        Self { config }
    }

    fn commands(&self, method: EncryptionMethod) -> Result<&MethodCommands, EngineError> {
        self.config
            .methods
            .get(&method)
            .ok_or_else(|| EngineError::new(format!("no command configured for {method}")))
    }
}

impl CryptoEngine for CommandEngine {
    fn encrypt(
        &self,
        plaintext: &str,
        method: EncryptionMethod,
        recipient: &str,
    ) -> Result<String, EngineError> {
        let spec = &self.commands(method)?.encrypt;
        let args = spec
            .args
            .iter()
            .map(|arg| arg.replace(RECIPIENT_PLACEHOLDER, recipient))
            .collect::<Vec<_>>();
        run(&spec.program, &args, &[], plaintext.as_bytes().to_vec())
    }

    fn decrypt(
        &self,
        ciphertext: &[u8],
        method: EncryptionMethod,
        passphrase: &str,
    ) -> Result<String, EngineError> {
        let spec = &self.commands(method)?.decrypt;
        match &spec.passphrase {
            PassphraseInput::Stdin => {
                let mut input = Vec::with_capacity(passphrase.len() + 1 + ciphertext.len());
                input.extend_from_slice(passphrase.as_bytes());
                input.push(b'\n');
                input.extend_from_slice(ciphertext);
                run(&spec.program, &spec.args, &[], input)
            }
            PassphraseInput::Env(var) => run(
                &spec.program,
                &spec.args,
                &[(var.as_str(), passphrase)],
                ciphertext.to_vec(),
            ),
        }
    }

    fn unarmour(&self, text: &str) -> Result<Vec<u8>, EngineError> {
        Ok(text.as_bytes().to_vec())
    }
}

fn run(
    program: &str,
    args: &[String],
    envs: &[(&str, &str)],
    input: Vec<u8>,
) -> Result<String, EngineError> {
    debug!(program, ?args, "running crypto command");

    let mut child = Command::new(program)
        .args(args)
        .envs(envs.iter().copied())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| EngineError::new(format!("cannot run {program}: {e}")))?;

    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| EngineError::new(format!("{program}: stdin unavailable")))?;
    // Fed from a separate thread so a chatty child cannot deadlock on a full pipe.
    let writer = thread::spawn(move || stdin.write_all(&input));

    let output = child
        .wait_with_output()
        .map_err(|e| EngineError::new(format!("{program}: {e}")))?;
    // A child that exits without draining stdin breaks the pipe; its exit
    // status below is the meaningful error.
    let _ = writer.join();

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        return Err(EngineError::new(if stderr.is_empty() {
            format!("{program} exited with {}", output.status)
        } else {
            stderr
        }));
    }

    String::from_utf8(output.stdout)
        .map_err(|_| EngineError::new(format!("{program} produced non-text output")))
}
