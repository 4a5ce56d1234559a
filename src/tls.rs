use std::io::{self, BufReader};
use std::sync::Arc;
use thiserror::Error;
use tokio_rustls::rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use tokio_rustls::rustls::ServerConfig;
use tokio_rustls::TlsAcceptor;

#[derive(Debug, Error)]
pub enum TlsError {
    #[error("failed to read certificate material: {0}")]
    Io(#[from] io::Error),
    #[error("no certificates found in PEM input")]
    NoCertificates,
    #[error("no private key found in PEM input")]
    NoPrivateKey,
    #[error("invalid certificate or key: {0}")]
    Rustls(#[from] tokio_rustls::rustls::Error),
    #[error("failed to generate fallback certificate: {0}")]
    Generate(#[from] rcgen::Error),
}

pub fn acceptor_from_pem(cert_pem: &[u8], key_pem: &[u8]) -> Result<TlsAcceptor, TlsError> {
    let certs = rustls_pemfile::certs(&mut BufReader::new(cert_pem))
        .collect::<Result<Vec<_>, _>>()?;
    if certs.is_empty() {
        return Err(TlsError::NoCertificates);
    }
    let key = rustls_pemfile::private_key(&mut BufReader::new(key_pem))?
        .ok_or(TlsError::NoPrivateKey)?;
    build(certs, key)
}

/// Self-signed certificate for when no material is supplied. Clients will
/// warn; this exists so `--tls` works out of the box in local setups.
pub fn acceptor_self_signed() -> Result<TlsAcceptor, TlsError> {
    let rcgen::CertifiedKey { cert, signing_key } =
        rcgen::generate_simple_self_signed(vec!["localhost".to_string()])?;
    let certs = vec![cert.der().clone()];
    let key = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(signing_key.serialize_der()));
    build(certs, key)
}

fn build(
    certs: Vec<CertificateDer<'static>>,
    key: PrivateKeyDer<'static>,
) -> Result<TlsAcceptor, TlsError> {
    let mut config = ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)?;
    config.alpn_protocols = vec![b"h2".to_vec(), b"http/1.1".to_vec()];
    Ok(TlsAcceptor::from(Arc::new(config)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_signed_acceptor_builds() {
        acceptor_self_signed().unwrap();
    }

    #[test]
    fn pem_material_round_trips() {
        let rcgen::CertifiedKey { cert, signing_key } =
            rcgen::generate_simple_self_signed(vec!["localhost".to_string()]).unwrap();
        acceptor_from_pem(cert.pem().as_bytes(), signing_key.serialize_pem().as_bytes()).unwrap();
    }

    #[test]
    fn empty_pem_is_rejected() {
        match acceptor_from_pem(b"", b"") {
            Err(TlsError::NoCertificates) => {}
            other => panic!("unexpected: {:?}", other.map(|_| ())),
        }
    }
}
