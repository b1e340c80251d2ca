//! Keystamp command-line tool.
//!
//! # Usage
//!
//! ```bash
//! # Recipient: create a key pair
//! keystamp keygen
//!
//! # Custodian: seal a credential to the recipient's public key
//! keystamp seal --recipient 04ab… --credential 1f2e… --format base64url
//!
//! # Recipient: open the bundle and stamp a request body
//! keystamp stamp --recipient-key 5c1d… --bundle 3xYz… --payload '{"type":"ACTIVITY"}'
//! ```

use std::io::{self, Write};

use clap::{Parser, Subcommand, ValueEnum};
use keystamp_core::{BundleFormat, Stamper, StamperConfig, StamperError, bundle::credential_suite};
use keystamp_crypto::CryptoError;
use thiserror::Error;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Keystamp credential delivery and request stamping
#[derive(Parser, Debug)]
#[command(name = "keystamp")]
#[command(about = "Offline credential bundle and stamp tool")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn", global = true)]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a P-256 recipient key pair
    Keygen,

    /// Seal a credential to a recipient public key
    Seal {
        /// Recipient public key (uncompressed SEC1, hex)
        #[arg(long)]
        recipient: String,

        /// Credential private key (32-byte scalar, hex)
        #[arg(long)]
        credential: String,

        /// HPKE info (hex)
        #[arg(long, default_value = "")]
        info: String,

        /// Bundle text encoding
        #[arg(long, value_enum, default_value_t = Format::Base58)]
        format: Format,
    },

    /// Open a bundle and stamp a payload
    Stamp {
        /// Recipient private key (32-byte scalar, hex)
        #[arg(long)]
        recipient_key: String,

        /// Credential bundle text
        #[arg(long)]
        bundle: String,

        /// Payload to sign
        #[arg(long)]
        payload: String,

        /// HPKE info (hex)
        #[arg(long, default_value = "")]
        info: String,

        /// Bundle text encoding (detected when omitted)
        #[arg(long, value_enum)]
        format: Option<Format>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum Format {
    Base58,
    Base64url,
}

impl From<Format> for BundleFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Base58 => BundleFormat::Base58Check,
            Format::Base64url => BundleFormat::Base64Url,
        }
    }
}

#[derive(Error, Debug)]
enum CliError {
    #[error("--{argument} is not valid hex: {source}")]
    Hex {
        argument: &'static str,
        #[source]
        source: hex::FromHexError,
    },

    #[error(transparent)]
    Stamper(#[from] StamperError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Io(#[from] io::Error),
}

fn decode_hex(argument: &'static str, value: &str) -> Result<Vec<u8>, CliError> {
    hex::decode(value.trim()).map_err(|source| CliError::Hex { argument, source })
}

fn keygen(out: &mut impl Write) -> Result<(), CliError> {
    let suite = credential_suite();
    let pair = suite.kem().generate_key_pair()?;
    let private_key = suite.kem().serialize_private_key(&pair.private_key)?;

    writeln!(out, "private_key: {}", hex::encode(private_key.as_bytes()))?;
    writeln!(out, "public_key: {}", hex::encode(pair.public_key.as_bytes()))?;
    Ok(())
}

fn seal(
    out: &mut impl Write,
    recipient: &str,
    credential: &str,
    info: &str,
    format: Format,
) -> Result<(), CliError> {
    let recipient = decode_hex("recipient", recipient)?;
    let credential = decode_hex("credential", credential)?;
    let info = decode_hex("info", info)?;

    let bundle = keystamp_core::seal_credential(&recipient, &credential, &info, format.into())?;
    tracing::info!(len = bundle.len(), "sealed credential bundle");
    writeln!(out, "{bundle}")?;
    Ok(())
}

fn stamp(
    out: &mut impl Write,
    recipient_key: &str,
    bundle: &str,
    payload: &str,
    info: &str,
    format: Option<Format>,
) -> Result<(), CliError> {
    let recipient_key = decode_hex("recipient-key", recipient_key)?;
    let config = StamperConfig {
        hpke_info: decode_hex("info", info)?,
        bundle_format: format.map_or(BundleFormat::Auto, BundleFormat::from),
    };

    let mut stamper =
        Stamper::with_recipient_key(config, keystamp_core::RustCryptoProvider, &recipient_key)?;
    stamper.inject_credential_bundle(bundle)?;
    let stamp = stamper.stamp(payload)?;

    writeln!(out, "{}: {}", stamp.header_name, stamp.header_value)?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer().with_writer(io::stderr)).with(filter).init();

    let mut out = io::stdout().lock();
    match args.command {
        Command::Keygen => keygen(&mut out)?,
        Command::Seal { recipient, credential, info, format } => {
            seal(&mut out, &recipient, &credential, &info, format)?;
        },
        Command::Stamp { recipient_key, bundle, payload, info, format } => {
            stamp(&mut out, &recipient_key, &bundle, &payload, &info, format)?;
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use keystamp_core::{STAMP_HEADER_NAME, Stamp};

    use super::*;

    fn lines(buffer: &[u8]) -> Vec<String> {
        String::from_utf8(buffer.to_vec()).unwrap().lines().map(str::to_string).collect()
    }

    #[test]
    fn keygen_seal_stamp_pipeline() {
        let mut keys = Vec::new();
        keygen(&mut keys).unwrap();
        let keys = lines(&keys);
        let private_key = keys[0].strip_prefix("private_key: ").unwrap();
        let public_key = keys[1].strip_prefix("public_key: ").unwrap();

        let mut sealed = Vec::new();
        seal(&mut sealed, public_key, &"2b".repeat(32), "", Format::Base64url).unwrap();
        let bundle = lines(&sealed).remove(0);

        let mut stamped = Vec::new();
        stamp(&mut stamped, private_key, &bundle, "payload", "", None).unwrap();
        let line = lines(&stamped).remove(0);
        let (name, value) = line.split_once(": ").unwrap();
        assert_eq!(name, STAMP_HEADER_NAME);

        let stamp = Stamp { header_name: name.to_string(), header_value: value.to_string() };
        assert_eq!(stamp.decode_envelope().unwrap().scheme, keystamp_core::SIGNATURE_SCHEME);
    }

    #[test]
    fn bad_hex_names_the_argument() {
        let err = seal(&mut Vec::new(), "zz", "00", "", Format::Base58).unwrap_err();
        assert!(err.to_string().starts_with("--recipient is not valid hex"));
    }

    #[test]
    fn args_parse() {
        let args = Args::try_parse_from([
            "keystamp",
            "stamp",
            "--recipient-key",
            "01",
            "--bundle",
            "abc",
            "--payload",
            "{}",
            "--format",
            "base64url",
        ])
        .unwrap();
        assert!(matches!(args.command, Command::Stamp { format: Some(Format::Base64url), .. }));
    }
}
