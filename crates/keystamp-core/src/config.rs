//! Stamper configuration.

use crate::bundle::BundleFormat;

/// Stamper configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StamperConfig {
    /// Bytes passed as HPKE `info` when opening a credential bundle. Must
    /// match what the custodian sealed with (empty by default).
    pub hpke_info: Vec<u8>,
    /// How bundle text is decoded
    pub bundle_format: BundleFormat,
}

impl StamperConfig {
    /// Default configuration with an explicit bundle format.
    #[must_use]
    pub fn with_format(bundle_format: BundleFormat) -> Self {
        Self { bundle_format, ..Self::default() }
    }
}
