//! Versioned on-disk envelope shared by every persisted model artifact.
//!
//! Layout: `b"SPAM"` | header (`kind`, `format_version`) | payload, where the
//! header and payload are `bincode` encoded with the standard configuration.
//! Decoding is size limited and rejects anything that is not exactly one
//! envelope of the expected kind and version.

use core::fmt;

use bincode::{
    config::{Configuration, Limit, LittleEndian, Varint},
    Decode, Encode,
};
use tracing::debug;

const MAGIC: [u8; 4] = *b"SPAM";

/// Upper bound on anything a single artifact may claim to contain.
const MAX_ARTIFACT_BYTES: usize = 512 * 1024 * 1024;

type ArtifactConfig = Configuration<LittleEndian, Varint, Limit<MAX_ARTIFACT_BYTES>>;

fn config() -> ArtifactConfig {
    bincode::config::standard().with_limit::<MAX_ARTIFACT_BYTES>()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Encode, Decode)]
pub enum ArtifactKind {
    Vectorizer,
    Classifier,
}

impl ArtifactKind {
    /// The only payload version this build reads and writes.
    #[must_use]
    pub const fn format_version(self) -> u32 {
        match self {
            Self::Vectorizer | Self::Classifier => 1,
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vectorizer => write!(f, "vectorizer"),
            Self::Classifier => write!(f, "classifier"),
        }
    }
}

#[derive(Debug, Encode, Decode)]
struct Header {
    kind: ArtifactKind,
    format_version: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("not a spam classifier artifact (bad magic bytes)")]
    BadMagic,

    #[error("expected a {expected} artifact but found a {found} artifact")]
    WrongKind {
        expected: ArtifactKind,
        found: ArtifactKind,
    },

    #[error(
        "unsupported {kind} artifact format version {found} \
         (this build reads version {supported})"
    )]
    UnsupportedVersion {
        kind: ArtifactKind,
        found: u32,
        supported: u32,
    },

    #[error("failed to encode artifact: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("failed to decode artifact: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("artifact has {0} unexpected trailing bytes")]
    TrailingBytes(usize),

    #[error("invalid {kind} artifact: {reason}")]
    Invalid { kind: ArtifactKind, reason: String },
}

impl ArtifactError {
    pub fn invalid(kind: ArtifactKind, reason: impl Into<String>) -> Self {
        Self::Invalid {
            kind,
            reason: reason.into(),
        }
    }
}

/// Wrap `payload` in a versioned envelope of the given kind.
pub fn encode<T: Encode>(kind: ArtifactKind, payload: &T) -> Result<Vec<u8>, ArtifactError> {
    let header = Header {
        kind,
        format_version: kind.format_version(),
    };
    let mut bytes = MAGIC.to_vec();
    bytes.extend(bincode::encode_to_vec(&header, config())?);
    bytes.extend(bincode::encode_to_vec(payload, config())?);
    debug!(%kind, num_bytes = bytes.len(), "Encoded artifact");
    Ok(bytes)
}

/// Unwrap an envelope, checking magic, kind and format version before the payload is decoded.
pub fn decode<T: Decode<()>>(kind: ArtifactKind, bytes: &[u8]) -> Result<T, ArtifactError> {
    let body = bytes
        .strip_prefix(MAGIC.as_slice())
        .ok_or(ArtifactError::BadMagic)?;

    let (header, header_len): (Header, usize) = bincode::decode_from_slice(body, config())?;
    if header.kind != kind {
        return Err(ArtifactError::WrongKind {
            expected: kind,
            found: header.kind,
        });
    }
    if header.format_version != kind.format_version() {
        return Err(ArtifactError::UnsupportedVersion {
            kind,
            found: header.format_version,
            supported: kind.format_version(),
        });
    }

    let payload = &body[header_len..];
    let (value, payload_len): (T, usize) = bincode::decode_from_slice(payload, config())?;
    let trailing = payload.len() - payload_len;
    if trailing != 0 {
        return Err(ArtifactError::TrailingBytes(trailing));
    }
    debug!(%kind, num_bytes = bytes.len(), "Decoded artifact");
    Ok(value)
}
