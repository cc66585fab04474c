use std::fmt;
use std::path::Path;

use crate::error::{LedgerError, LedgerResult};

/// Credentials a client submits transactions under.
#[derive(Clone, PartialEq, Eq)]
pub struct Identity {
    msp_id: String,
    certificate: String,
    private_key: String,
}

impl Identity {
    pub fn new(
        msp_id: impl Into<String>,
        certificate: impl Into<String>,
        private_key: impl Into<String>,
    ) -> Self {
        Self {
            msp_id: msp_id.into(),
            certificate: certificate.into(),
            private_key: private_key.into(),
        }
    }

    /// Load a PEM certificate and private key from disk.
    pub fn from_files(msp_id: &str, cert_path: &Path, key_path: &Path) -> LedgerResult<Self> {
        if msp_id.is_empty() {
            return Err(LedgerError::Config("MSP id must not be empty".into()));
        }
        let certificate = read_pem(cert_path)?;
        let private_key = read_pem(key_path)?;
        Ok(Self::new(msp_id, certificate, private_key))
    }

    pub fn msp_id(&self) -> &str {
        &self.msp_id
    }

    pub fn certificate(&self) -> &str {
        &self.certificate
    }
}

fn read_pem(path: &Path) -> LedgerResult<String> {
    let contents = std::fs::read_to_string(path).map_err(|source| LedgerError::Identity {
        path: path.to_path_buf(),
        source,
    })?;
    if contents.trim().is_empty() {
        return Err(LedgerError::Config(format!("{} is empty", path.display())));
    }
    Ok(contents)
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("msp_id", &self.msp_id)
            .field("certificate_len", &self.certificate.len())
            .field("private_key", &"<redacted>")
            .finish()
    }
}
