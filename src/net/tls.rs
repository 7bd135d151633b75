//! TLS material loading for the encrypted listener.

use std::io;
use std::path::Path;

use axum_server::tls_rustls::RustlsConfig;

/// Select the process-wide rustls crypto provider.
///
/// More than one provider is compiled in (the storage driver brings its
/// own), so rustls cannot pick one implicitly.
pub fn install_crypto_provider() {
    if rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .is_err()
    {
        tracing::debug!("rustls crypto provider already installed");
    }
}

/// Load a rustls server configuration from PEM certificate and key files.
pub async fn load_tls_config(cert_path: &Path, key_path: &Path) -> io::Result<RustlsConfig> {
    for (what, path) in [("Certificate", cert_path), ("Private key", key_path)] {
        if tokio::fs::metadata(path).await.is_err() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{what} file not found: {}", path.display()),
            ));
        }
    }

    RustlsConfig::from_pem_file(cert_path, key_path).await
}
