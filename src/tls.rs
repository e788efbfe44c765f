//! TLS material loading for the HTTPS listener

use crate::config::TlsConfig;
use anyhow::Context;
use rustls::pki_types::{pem::PemObject, CertificateDer, PrivateKeyDer};
use std::sync::Arc;
use tokio_rustls::TlsAcceptor;

/// Build a TLS acceptor from the PEM certificate chain and private key
/// named by `cfg`. Missing or malformed material is a startup failure.
pub fn load_tls_acceptor(cfg: &TlsConfig) -> anyhow::Result<TlsAcceptor> {
    let certs = CertificateDer::pem_file_iter(&cfg.cert_path)
        .with_context(|| format!("failed to open certificate file {}", cfg.cert_path))?
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("failed to parse certificate file {}", cfg.cert_path))?;

    let key = PrivateKeyDer::from_pem_file(&cfg.key_path)
        .with_context(|| format!("failed to load private key {}", cfg.key_path))?;

    let config = rustls::ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)
        .context("invalid certificate/key pair")?;

    Ok(TlsAcceptor::from(Arc::new(config)))
}
