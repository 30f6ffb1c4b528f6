//! # Message Encryption Service
//!
//! Application service layer that implements the `MessageCryptApi` trait.
//!
//! ## Architecture
//!
//! This is the hexagonal "application service" that:
//! - Implements the inbound port (`MessageCryptApi`)
//! - Resolves capability through the `Directory` and `AddressFormatter` ports
//! - Delegates the cryptography to the `CryptoEngine` port
//!
//! The envelope is only modified after the engine call succeeded, so no
//! failure path produces a half-rewritten message.

use crate::domain::address::FtnAddress;
use crate::domain::capability::CapabilityResolver;
use crate::domain::config::CryptConfig;
use crate::domain::entities::{NodeCapability, OperationResult};
use crate::domain::envelope::{Envelope, TagArea};
use crate::domain::errors::CryptError;
use crate::domain::method::EncryptionMethod;
use crate::ports::inbound::MessageCryptApi;
use crate::ports::outbound::{AddressFormatter, CryptoEngine, Directory};
use tracing::{debug, info, info_span, warn};

/// Tag name recording the method a body was encrypted with.
pub const METHOD_TAG: &str = "ENC";

/// First line of an ASCII-armoured PGP message.
pub const ARMOUR_BEGIN: &str = "-----BEGIN PGP MESSAGE-----";

/// Whether `text` carries an armoured PGP block.
pub fn is_armoured(text: &str) -> bool {
    text.lines().any(|line| line.trim_end() == ARMOUR_BEGIN)
}

/// Netmail encryption service.
pub struct MessageCryptService<D: Directory, F: AddressFormatter, E: CryptoEngine> {
    resolver: CapabilityResolver<D, F>,
    engine: E,
    marker_area: TagArea,
}

impl<D: Directory, F: AddressFormatter, E: CryptoEngine> MessageCryptService<D, F, E> {
    /// Create a new service.
    ///
    /// # Arguments
    /// * `directory` - node directory used for every capability lookup
    /// * `formatter` - derives node FQDNs for destination addresses
    /// * `engine` - external crypto engine
    /// * `config` - destination local-part and marker placement
    pub fn new(directory: D, formatter: F, engine: E, config: CryptConfig) -> Self {
        Self {
            resolver: CapabilityResolver::new(directory, formatter, config.local_part),
            engine,
            marker_area: config.marker_area,
        }
    }

    pub fn resolver(&self) -> &CapabilityResolver<D, F> {
        &self.resolver
    }

    fn capable_method(
        &self,
        address: &FtnAddress,
    ) -> Result<(NodeCapability, EncryptionMethod), CryptError> {
        let capability = self.resolver.resolve(address)?;
        match capability.method {
            Some(method) => Ok((capability, method)),
            None => Err(CryptError::NoCapability),
        }
    }

    fn try_encrypt(&self, address: &FtnAddress, raw_message: &str) -> Result<String, CryptError> {
        let (capability, method) = self.capable_method(address)?;
        let mut envelope = Envelope::decode(raw_message);

        let ciphertext =
            self.engine
                .encrypt(envelope.body(), method, &capability.destination_address)?;

        envelope.set_display_text(&ciphertext);
        envelope.add_tag(self.marker_area, &format!("{METHOD_TAG}: {method}"))?;
        info!(%address, %method, "message body encrypted");
        Ok(envelope.encode())
    }

    fn try_decrypt(
        &self,
        address: &FtnAddress,
        raw_message: &str,
        passphrase: &str,
    ) -> Result<String, CryptError> {
        if passphrase.is_empty() {
            return Err(CryptError::Validation("passphrase is empty".to_string()));
        }

        let mut envelope = Envelope::decode(raw_message);
        let recorded = envelope
            .last_tag_value(METHOD_TAG)
            .map(str::to_string)
            .ok_or(CryptError::NotEncrypted)?;

        let (_, advertised) = self.capable_method(address)?;
        if recorded != advertised.as_str() {
            warn!(%address, %recorded, %advertised, "refusing decrypt on method mismatch");
            return Err(CryptError::MethodMismatch {
                recorded,
                advertised,
            });
        }

        let armoured = envelope.display_text();
        let ciphertext = if is_armoured(&armoured) {
            debug!(%address, "unarmouring message body");
            self.engine.unarmour(&armoured)?
        } else {
            envelope.body().as_bytes().to_vec()
        };

        let plaintext = self.engine.decrypt(&ciphertext, advertised, passphrase)?;

        envelope.set_body(plaintext);
        for area in [TagArea::Header, TagArea::Footer] {
            envelope.remove_tag(area, METHOD_TAG)?;
        }
        info!(%address, method = %advertised, "message body decrypted");
        Ok(envelope.encode())
    }
}

impl<D: Directory, F: AddressFormatter, E: CryptoEngine> MessageCryptApi
    for MessageCryptService<D, F, E>
{
    fn capability(&self, address: &FtnAddress) -> Result<NodeCapability, CryptError> {
        Ok(self.resolver.resolve(address)?)
    }

    fn encrypt(&self, address: &FtnAddress, raw_message: &str) -> OperationResult {
        let _span = info_span!("encrypt", %address).entered();
        self.try_encrypt(address, raw_message).into()
    }

    fn decrypt(
        &self,
        address: &FtnAddress,
        raw_message: &str,
        passphrase: &str,
    ) -> OperationResult {
        let _span = info_span!("decrypt", %address).entered();
        self.try_decrypt(address, raw_message, passphrase).into()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::NodeRecord;
    use crate::ports::outbound::{DirectoryError, EngineError};
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    // =========================================================================
    // Mock collaborators
    // =========================================================================

    struct MockDirectory {
        records: Mutex<HashMap<FtnAddress, Vec<String>>>,
    }

    impl MockDirectory {
        fn with(address: FtnAddress, flags: &[&str]) -> Self {
            let mut records = HashMap::new();
            records.insert(address, flags.iter().map(|f| f.to_string()).collect());
            Self {
                records: Mutex::new(records),
            }
        }

        fn set_flags(&self, address: FtnAddress, flags: &[&str]) {
            self.records
                .lock()
                .unwrap()
                .insert(address, flags.iter().map(|f| f.to_string()).collect());
        }
    }

    impl Directory for MockDirectory {
        fn lookup(&self, address: &FtnAddress) -> Result<NodeRecord, DirectoryError> {
            self.records
                .lock()
                .unwrap()
                .get(address)
                .map(|flags| NodeRecord::new(*address, flags.clone()))
                .ok_or_else(|| DirectoryError::NotFound {
                    address: address.to_string(),
                })
        }
    }

    struct PlainFormatter;

    impl AddressFormatter for PlainFormatter {
        fn fqdn(&self, address: &FtnAddress) -> String {
            format!("f{}.n{}.z{}.fidonet.org", address.node, address.net, address.zone)
        }
    }

    /// Engine that reverses text and counts every call.
    #[derive(Default)]
    struct ReversingEngine {
        calls: AtomicUsize,
        recipients: Mutex<Vec<String>>,
    }

    impl CryptoEngine for ReversingEngine {
        fn encrypt(
            &self,
            plaintext: &str,
            _method: EncryptionMethod,
            recipient: &str,
        ) -> Result<String, EngineError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.recipients.lock().unwrap().push(recipient.to_string());
            Ok(plaintext.chars().rev().collect())
        }

        fn decrypt(
            &self,
            ciphertext: &[u8],
            _method: EncryptionMethod,
            passphrase: &str,
        ) -> Result<String, EngineError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if passphrase != "secret" {
                return Err(EngineError::new("bad passphrase"));
            }
            let text = String::from_utf8(ciphertext.to_vec())
                .map_err(|e| EngineError::new(e.to_string()))?;
            Ok(text.chars().rev().collect())
        }

        fn unarmour(&self, text: &str) -> Result<Vec<u8>, EngineError> {
            Ok(text.as_bytes().to_vec())
        }
    }

    struct FailingEngine;

    impl CryptoEngine for FailingEngine {
        fn encrypt(&self, _: &str, _: EncryptionMethod, _: &str) -> Result<String, EngineError> {
            Err(EngineError::new("gpg: sysop@f1042.n5020.z2.fidonet.org: skipped: No public key"))
        }

        fn decrypt(&self, _: &[u8], _: EncryptionMethod, _: &str) -> Result<String, EngineError> {
            Err(EngineError::new("gpg: decryption failed: No secret key"))
        }

        fn unarmour(&self, _: &str) -> Result<Vec<u8>, EngineError> {
            Err(EngineError::new("gpg: no valid OpenPGP data found"))
        }
    }

    fn node() -> FtnAddress {
        FtnAddress::new(2, 5020, 1042, 0)
    }

    fn service_with<E: CryptoEngine>(
        flags: &[&str],
        engine: E,
    ) -> MessageCryptService<MockDirectory, PlainFormatter, E> {
        MessageCryptService::new(
            MockDirectory::with(node(), flags),
            PlainFormatter,
            engine,
            CryptConfig::default(),
        )
    }

    const MESSAGE: &str = "\x01MSGID: 2:5020/1042 1\rHello there\rSecond line\r\x01PATH: 5020/1042";

    // =========================================================================
    // Encrypt
    // =========================================================================

    #[test]
    fn test_encrypt_adds_marker_and_replaces_body() {
        let service = service_with(&["CM", "CRYPT:GnuPG"], ReversingEngine::default());

        let result = service.encrypt(&node(), MESSAGE);

        assert!(result.ok, "{}", result.text_or_error);
        let env = Envelope::decode(&result.text_or_error);
        assert_eq!(env.header(), ["MSGID: 2:5020/1042 1", "ENC: GnuPG"]);
        assert_eq!(env.body(), "enil dnoceS\rereht olleH");
        assert_eq!(env.footer(), ["PATH: 5020/1042"]);
    }

    #[test]
    fn test_encrypt_uses_destination_address() {
        let engine = ReversingEngine::default();
        let service = service_with(&["CRYPT:PGP5"], engine);

        assert!(service.encrypt(&node(), MESSAGE).ok);
        assert_eq!(
            service.engine.recipients.lock().unwrap().as_slice(),
            ["sysop@f1042.n5020.z2.fidonet.org"]
        );
    }

    #[test]
    fn test_encrypt_marker_in_footer_when_configured() {
        let service = MessageCryptService::new(
            MockDirectory::with(node(), &["CRYPT:PGP2"]),
            PlainFormatter,
            ReversingEngine::default(),
            CryptConfig::default().with_marker_area(TagArea::Footer),
        );

        let result = service.encrypt(&node(), MESSAGE);
        let env = Envelope::decode(&result.text_or_error);
        assert_eq!(env.footer(), ["PATH: 5020/1042", "ENC: PGP2"]);
    }

    #[test]
    fn test_encrypt_without_flag_reports_no_capability() {
        let service = service_with(&["CM", "XA"], ReversingEngine::default());

        let result = service.encrypt(&node(), MESSAGE);

        assert!(!result.ok);
        assert_eq!(result.text_or_error, "no encryption-capable destination");
        assert_eq!(result.error, Some(CryptError::NoCapability));
        assert_eq!(service.engine.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_encrypt_unlisted_node_reports_no_capability() {
        let service = service_with(&["CRYPT:GnuPG"], ReversingEngine::default());

        let result = service.encrypt(&FtnAddress::new(1, 2, 3, 0), MESSAGE);

        assert!(!result.ok);
        assert_eq!(result.text_or_error, "no encryption-capable destination");
        assert!(matches!(result.error, Some(CryptError::NotFound { .. })));
    }

    #[test]
    fn test_encrypt_engine_error_is_verbatim() {
        let service = service_with(&["CRYPT:GnuPG"], FailingEngine);

        let result = service.encrypt(&node(), MESSAGE);

        assert!(!result.ok);
        assert_eq!(
            result.text_or_error,
            "gpg: sysop@f1042.n5020.z2.fidonet.org: skipped: No public key"
        );
    }

    // =========================================================================
    // Decrypt
    // =========================================================================

    #[test]
    fn test_round_trip_restores_body_and_drops_marker() {
        let service = service_with(&["CRYPT:GnuPG"], ReversingEngine::default());

        let encrypted = service.encrypt(&node(), MESSAGE);
        assert!(encrypted.ok);
        let decrypted = service.decrypt(&node(), &encrypted.text_or_error, "secret");

        assert!(decrypted.ok, "{}", decrypted.text_or_error);
        assert_eq!(decrypted.text_or_error, MESSAGE);
        let env = Envelope::decode(&decrypted.text_or_error);
        assert_eq!(env.last_tag_value(METHOD_TAG), None);
    }

    #[test]
    fn test_decrypt_empty_passphrase_fails_before_engine() {
        let service = service_with(&["CRYPT:GnuPG"], ReversingEngine::default());
        let encrypted = service.encrypt(&node(), MESSAGE).text_or_error;
        service.engine.calls.store(0, Ordering::SeqCst);

        let result = service.decrypt(&node(), &encrypted, "");

        assert!(!result.ok);
        assert!(matches!(result.error, Some(CryptError::Validation(_))));
        assert_eq!(service.engine.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_decrypt_unmarked_message_is_not_encrypted() {
        let service = service_with(&["CRYPT:GnuPG"], ReversingEngine::default());

        let result = service.decrypt(&node(), MESSAGE, "secret");

        assert_eq!(result.error, Some(CryptError::NotEncrypted));
        assert_eq!(result.text_or_error, "message is not encrypted");
    }

    #[test]
    fn test_decrypt_method_mismatch_is_refused() {
        let service = service_with(&["CRYPT:GnuPG"], ReversingEngine::default());
        let encrypted = service.encrypt(&node(), MESSAGE).text_or_error;
        service.resolver().directory().set_flags(node(), &["CRYPT:PGP2"]);
        service.engine.calls.store(0, Ordering::SeqCst);

        let result = service.decrypt(&node(), &encrypted, "secret");

        assert!(!result.ok);
        assert_eq!(
            result.text_or_error,
            "method mismatch: message uses GnuPG, node now advertises PGP2"
        );
        assert_eq!(service.engine.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_decrypt_after_node_dropped_capability() {
        let service = service_with(&["CRYPT:GnuPG"], ReversingEngine::default());
        let encrypted = service.encrypt(&node(), MESSAGE).text_or_error;
        service.resolver().directory().set_flags(node(), &["CM"]);

        let result = service.decrypt(&node(), &encrypted, "secret");

        assert_eq!(result.error, Some(CryptError::NoCapability));
    }

    #[test]
    fn test_decrypt_uses_last_marker() {
        let service = service_with(&["CRYPT:PGP5"], ReversingEngine::default());
        let raw = "\x01ENC: GnuPG\rtxet\r\x01ENC: PGP5";

        let result = service.decrypt(&node(), raw, "secret");

        assert!(result.ok, "{}", result.text_or_error);
        // Both tag areas are now empty and still emit their separators.
        assert_eq!(result.text_or_error, "\rtext\r");
    }

    #[test]
    fn test_decrypt_engine_error_leaves_no_partial_state() {
        let service = service_with(&["CRYPT:GnuPG"], ReversingEngine::default());
        let encrypted = service.encrypt(&node(), MESSAGE).text_or_error;

        let result = service.decrypt(&node(), &encrypted, "wrong");

        assert!(!result.ok);
        assert_eq!(result.text_or_error, "bad passphrase");
        assert_eq!(result.error, Some(CryptError::Engine("bad passphrase".into())));
    }

    #[test]
    fn test_decrypt_unarmour_failure_is_verbatim() {
        let service = service_with(&["CRYPT:GnuPG"], FailingEngine);
        let raw = format!("\x01ENC: GnuPG\r{ARMOUR_BEGIN}\rabc\r-----END PGP MESSAGE-----");

        let result = service.decrypt(&node(), &raw, "secret");

        assert_eq!(result.text_or_error, "gpg: no valid OpenPGP data found");
    }

    #[test]
    fn test_is_armoured() {
        assert!(is_armoured("-----BEGIN PGP MESSAGE-----\nVersion: x\n\nabc"));
        assert!(is_armoured("preamble\n-----BEGIN PGP MESSAGE-----\r\n"));
        assert!(!is_armoured("plain text"));
    }
}
