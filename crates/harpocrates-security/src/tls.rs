// SPDX-FileCopyrightText: 2026 Harpocrates Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! TLS configuration for the escrow transport.
//!
//! Both sides must present a certificate, but neither validates the other's
//! trust chain: trust is established out-of-band by the operator. Handshake
//! signatures are still verified, so a peer must hold the private key for the
//! certificate it presents.

use std::path::Path;
use std::sync::Arc;

use harpocrates_core::HarpocratesError;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::{verify_tls12_signature, verify_tls13_signature, CryptoProvider};
use rustls_pki_types::pem::PemObject;
use rustls_pki_types::{CertificateDer, PrivateKeyDer, ServerName, UnixTime};
use rustls::server::danger::{ClientCertVerified, ClientCertVerifier};
use rustls::{ClientConfig, DigitallySignedStruct, DistinguishedName, ServerConfig, SignatureScheme};
use tracing::{debug, error};

/// A certificate chain and its private key.
pub struct TlsIdentity {
    cert_chain: Vec<CertificateDer<'static>>,
    key: PrivateKeyDer<'static>,
}

impl TlsIdentity {
    pub fn new(cert_chain: Vec<CertificateDer<'static>>, key: PrivateKeyDer<'static>) -> Self {
        Self { cert_chain, key }
    }

    /// Load a PEM certificate chain and a PEM private key from disk.
    pub fn from_pem_files(cert_path: &Path, key_path: &Path) -> Result<Self, HarpocratesError> {
        let cert_chain = CertificateDer::pem_file_iter(cert_path)
            .and_then(|certs| certs.collect::<Result<Vec<_>, _>>())
            .map_err(|e| {
                error!(path = %cert_path.display(), "failed to read certificate: {e}");
                HarpocratesError::Security(format!(
                    "failed to read certificate {}: {e}",
                    cert_path.display()
                ))
            })?;
        let key = PrivateKeyDer::from_pem_file(key_path).map_err(|e| {
            error!(path = %key_path.display(), "failed to read private key: {e}");
            HarpocratesError::Security(format!(
                "failed to read private key {}: {e}",
                key_path.display()
            ))
        })?;
        Self::checked(cert_chain, key)
    }

    /// Parse a PEM certificate chain and a PEM private key held in memory.
    pub fn from_pem(cert_pem: &[u8], key_pem: &[u8]) -> Result<Self, HarpocratesError> {
        let cert_chain = CertificateDer::pem_slice_iter(cert_pem)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| HarpocratesError::Security(format!("invalid certificate PEM: {e}")))?;
        let key = PrivateKeyDer::from_pem_slice(key_pem)
            .map_err(|e| HarpocratesError::Security(format!("invalid private key PEM: {e}")))?;
        Self::checked(cert_chain, key)
    }

    fn checked(
        cert_chain: Vec<CertificateDer<'static>>,
        key: PrivateKeyDer<'static>,
    ) -> Result<Self, HarpocratesError> {
        if cert_chain.is_empty() {
            return Err(HarpocratesError::Security(
                "certificate file contains no certificates".to_string(),
            ));
        }
        Ok(Self { cert_chain, key })
    }

    pub fn cert_chain(&self) -> &[CertificateDer<'static>] {
        &self.cert_chain
    }
}

impl Clone for TlsIdentity {
    fn clone(&self) -> Self {
        Self {
            cert_chain: self.cert_chain.clone(),
            key: self.key.clone_key(),
        }
    }
}

impl std::fmt::Debug for TlsIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsIdentity")
            .field("certificates", &self.cert_chain.len())
            .field("key", &"[REDACTED]")
            .finish()
    }
}

fn provider() -> Arc<CryptoProvider> {
    Arc::new(rustls::crypto::ring::default_provider())
}

/// Server configuration that demands a client certificate without validating it.
pub fn build_server_config(identity: TlsIdentity) -> Result<Arc<ServerConfig>, HarpocratesError> {
    let provider = provider();
    let config = ServerConfig::builder_with_provider(provider.clone())
        .with_safe_default_protocol_versions()
        .map_err(tls_error)?
        .with_client_cert_verifier(Arc::new(AnyClientCertificate { provider }))
        .with_single_cert(identity.cert_chain, identity.key)
        .map_err(tls_error)?;
    debug!("built escrow server TLS configuration");
    Ok(Arc::new(config))
}

/// Client configuration that presents `identity` and skips server chain validation.
pub fn build_client_config(identity: TlsIdentity) -> Result<Arc<ClientConfig>, HarpocratesError> {
    let provider = provider();
    let config = ClientConfig::builder_with_provider(provider.clone())
        .with_safe_default_protocol_versions()
        .map_err(tls_error)?
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(AnyServerCertificate { provider }))
        .with_client_auth_cert(identity.cert_chain, identity.key)
        .map_err(tls_error)?;
    debug!("built escrow client TLS configuration");
    Ok(Arc::new(config))
}

/// Convert a host string into a TLS server name (DNS name or IP address).
pub fn server_name(host: &str) -> Result<ServerName<'static>, HarpocratesError> {
    ServerName::try_from(host.to_string())
        .map_err(|e| HarpocratesError::Security(format!("invalid server name `{host}`: {e}")))
}

fn tls_error(e: rustls::Error) -> HarpocratesError {
    HarpocratesError::Security(format!("TLS configuration failed: {e}"))
}

#[derive(Debug)]
struct AnyClientCertificate {
    provider: Arc<CryptoProvider>,
}

impl ClientCertVerifier for AnyClientCertificate {
    fn client_auth_mandatory(&self) -> bool {
        true
    }

    fn root_hint_subjects(&self) -> &[DistinguishedName] {
        &[]
    }

    fn verify_client_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _now: UnixTime,
    ) -> Result<ClientCertVerified, rustls::Error> {
        Ok(ClientCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(message, cert, dss, &self.provider.signature_verification_algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(message, cert, dss, &self.provider.signature_verification_algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}

#[derive(Debug)]
struct AnyServerCertificate {
    provider: Arc<CryptoProvider>,
}

impl ServerCertVerifier for AnyServerCertificate {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls12_signature(message, cert, dss, &self.provider.signature_verification_algorithms)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        verify_tls13_signature(message, cert, dss, &self.provider.signature_verification_algorithms)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}
