//! Binary serialization and deserialization of compiled rule sets.
//!
//! The format is a 32-byte fixed header followed by a bincode-encoded payload
//! holding the rule columns and the offer catalog.
//!
//! ## Wire Format
//!
//! ```text
//! Offset  Size  Field
//! 0       4     Magic bytes: b"OFFR"
//! 4       2     Format version (u16, little-endian)
//! 6       2     Engine version (u16, little-endian)
//! 8       4     Flags (u32, reserved)
//! 12      4     Payload length in bytes (u32, little-endian)
//! 16      16    BLAKE3 hash of the payload (truncated to 16 bytes)
//! 32..    var   Bincode-encoded payload
//! ```
//!
//! ## Versioning
//!
//! The format version must match exactly, otherwise decoding fails with
//! [`DeserializeError::IncompatibleVersion`]. The engine version is
//! informational only.
//!
//! A decoded payload is checked against the same invariants the compiler
//! enforces, so a blob that passes the checksum but was produced by a buggy
//! or hostile writer still cannot reach the evaluator.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{OfferCatalog, OfferCode, RuleSet};
use crate::{Bounds, SpendCondition, Window};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const MAGIC: &[u8; 4] = b"OFFR";
const FORMAT_VERSION: u16 = 1;
const ENGINE_VERSION: u16 = 1;
const HEADER_SIZE: usize = 32;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur when serializing a [`RuleSet`](crate::RuleSet) to bytes.
#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("failed to encode rule set: {0}")]
    Encode(#[from] bincode::error::EncodeError),

    #[error("payload of {0} bytes exceeds the 4 GiB format limit")]
    TooLarge(usize),

    #[error("I/O error during serialization: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur when deserializing a [`RuleSet`](crate::RuleSet) from bytes.
#[derive(Debug, Error)]
pub enum DeserializeError {
    #[error("not an offer rule set binary: invalid magic bytes")]
    BadMagic,

    #[error("incompatible format version: blob is v{blob}, engine supports v{supported}")]
    IncompatibleVersion { blob: u16, supported: u16 },

    #[error("integrity check failed: BLAKE3 checksum mismatch")]
    ChecksumMismatch,

    #[error("payload length mismatch: expected {expected} bytes, got {actual}")]
    LengthMismatch { expected: u32, actual: usize },

    #[error("failed to decode payload: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("I/O error during deserialization: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Serialized layout
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
struct SerializedRuleSet {
    metadata: RuleSetMetadata,
    names: Vec<String>,
    level: Vec<Bounds>,
    recency: Vec<Bounds>,
    losses: Vec<Bounds>,
    spend: Vec<SpendCondition>,
    weights: Vec<f64>,
    offers: Vec<u16>,
    windows: Vec<Option<Window>>,
    labels: Vec<String>,
    default_label: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct RuleSetMetadata {
    rule_count: usize,
    offer_count: usize,
    source_digest: Option<[u8; 32]>,
}

fn ruleset_to_serialized(ruleset: &RuleSet, source_text: Option<&str>) -> SerializedRuleSet {
    let source_digest = source_text.map(|s| *blake3::hash(s.as_bytes()).as_bytes());

    SerializedRuleSet {
        metadata: RuleSetMetadata {
            rule_count: ruleset.len(),
            offer_count: ruleset.catalog.len(),
            source_digest,
        },
        names: ruleset.names.clone(),
        level: ruleset.level.clone(),
        recency: ruleset.recency.clone(),
        losses: ruleset.losses.clone(),
        spend: ruleset.spend.clone(),
        weights: ruleset.weights.clone(),
        offers: ruleset.offers.iter().map(|code| code.0).collect(),
        windows: ruleset.windows.clone(),
        labels: ruleset.catalog.labels().to_vec(),
        default_label: ruleset.catalog.default_label().to_owned(),
    }
}

fn serialized_to_ruleset(ser: SerializedRuleSet) -> Result<RuleSet, DeserializeError> {
    validate(&ser)?;

    let catalog = OfferCatalog::from_labels(ser.labels, ser.default_label).ok_or_else(|| {
        DeserializeError::Validation("offer labels are not distinct".to_owned())
    })?;

    Ok(RuleSet {
        names: ser.names,
        level: ser.level,
        recency: ser.recency,
        losses: ser.losses,
        spend: ser.spend,
        weights: ser.weights,
        offers: ser.offers.into_iter().map(OfferCode).collect(),
        windows: ser.windows,
        catalog,
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(ser: &SerializedRuleSet) -> Result<(), DeserializeError> {
    let rule_count = ser.names.len();

    if ser.metadata.rule_count != rule_count {
        return Err(DeserializeError::Validation(format!(
            "metadata says {} rules but payload has {}",
            ser.metadata.rule_count, rule_count
        )));
    }
    if ser.metadata.offer_count != ser.labels.len() {
        return Err(DeserializeError::Validation(format!(
            "metadata says {} offers but payload has {}",
            ser.metadata.offer_count,
            ser.labels.len()
        )));
    }

    let columns = [
        ("level", ser.level.len()),
        ("recency", ser.recency.len()),
        ("losses", ser.losses.len()),
        ("spend", ser.spend.len()),
        ("weights", ser.weights.len()),
        ("offers", ser.offers.len()),
        ("windows", ser.windows.len()),
    ];
    for (column, len) in columns {
        if len != rule_count {
            return Err(DeserializeError::Validation(format!(
                "{column} column has {len} entries but {rule_count} rules exist"
            )));
        }
    }

    let mut seen = HashSet::with_capacity(rule_count);
    for name in &ser.names {
        if !seen.insert(name.as_str()) {
            return Err(DeserializeError::Validation(format!(
                "duplicate rule name '{name}'"
            )));
        }
    }

    for idx in 0..rule_count {
        let name = &ser.names[idx];
        for (condition, bounds) in [
            ("level", ser.level[idx]),
            ("recency", ser.recency[idx]),
            ("losses", ser.losses[idx]),
        ] {
            if !bounds.is_valid() {
                return Err(DeserializeError::Validation(format!(
                    "rule '{name}' has an empty {condition} range {bounds}"
                )));
            }
        }
        if let Some(window) = ser.windows[idx] {
            if window.start > window.end {
                return Err(DeserializeError::Validation(format!(
                    "rule '{name}' has an empty validity window"
                )));
            }
        }
        if !ser.weights[idx].is_finite() {
            return Err(DeserializeError::Validation(format!(
                "rule '{name}' has a non-finite weight"
            )));
        }
        if usize::from(ser.offers[idx]) >= ser.labels.len() {
            return Err(DeserializeError::Validation(format!(
                "rule '{name}' references offer code {} but only {} offers exist",
                ser.offers[idx],
                ser.labels.len()
            )));
        }
    }

    if ser.default_label.trim().is_empty() {
        return Err(DeserializeError::Validation(
            "empty default offer label".to_owned(),
        ));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Header I/O
// ---------------------------------------------------------------------------

fn write_header(buf: &mut Vec<u8>, payload: &[u8]) -> Result<(), SerializeError> {
    let payload_len =
        u32::try_from(payload.len()).map_err(|_| SerializeError::TooLarge(payload.len()))?;
    let hash = blake3::hash(payload);

    buf.extend_from_slice(MAGIC);
    buf.extend_from_slice(&FORMAT_VERSION.to_le_bytes());
    buf.extend_from_slice(&ENGINE_VERSION.to_le_bytes());
    buf.extend_from_slice(&0u32.to_le_bytes()); // flags (reserved)
    buf.extend_from_slice(&payload_len.to_le_bytes());
    buf.extend_from_slice(&hash.as_bytes()[..16]);
    Ok(())
}

#[allow(clippy::cast_possible_truncation)] // HEADER_SIZE is 32, always fits in u32
fn read_header(bytes: &[u8]) -> Result<(u16, u32, [u8; 16]), DeserializeError> {
    if bytes.len() < HEADER_SIZE {
        return Err(DeserializeError::LengthMismatch {
            expected: HEADER_SIZE as u32,
            actual: bytes.len(),
        });
    }

    if &bytes[0..4] != MAGIC {
        return Err(DeserializeError::BadMagic);
    }

    let format_version = u16::from_le_bytes([bytes[4], bytes[5]]);
    // bytes[6..8] engine version, bytes[8..12] flags
    let payload_len = u32::from_le_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]);

    let mut hash = [0u8; 16];
    hash.copy_from_slice(&bytes[16..32]);

    Ok((format_version, payload_len, hash))
}

fn payload(bytes: &[u8]) -> Result<SerializedRuleSet, DeserializeError> {
    let (format_version, payload_len, stored_hash) = read_header(bytes)?;

    if format_version != FORMAT_VERSION {
        return Err(DeserializeError::IncompatibleVersion {
            blob: format_version,
            supported: FORMAT_VERSION,
        });
    }

    let payload_end = HEADER_SIZE + payload_len as usize;
    if bytes.len() != payload_end {
        return Err(DeserializeError::LengthMismatch {
            expected: payload_len,
            actual: bytes.len() - HEADER_SIZE,
        });
    }
    let payload = &bytes[HEADER_SIZE..payload_end];

    if blake3::hash(payload).as_bytes()[..16] != stored_hash {
        return Err(DeserializeError::ChecksumMismatch);
    }

    let (serialized, _): (SerializedRuleSet, usize) =
        bincode::serde::decode_from_slice(payload, bincode::config::standard())?;
    Ok(serialized)
}

// ---------------------------------------------------------------------------
// Public encode/decode
// ---------------------------------------------------------------------------

pub(crate) fn encode(
    ruleset: &RuleSet,
    source_text: Option<&str>,
) -> Result<Vec<u8>, SerializeError> {
    let serialized = ruleset_to_serialized(ruleset, source_text);
    let payload = bincode::serde::encode_to_vec(&serialized, bincode::config::standard())?;

    let mut buf = Vec::with_capacity(HEADER_SIZE + payload.len());
    write_header(&mut buf, &payload)?;
    buf.extend_from_slice(&payload);
    tracing::debug!(
        rules = ruleset.len(),
        bytes = buf.len(),
        "encoded rule set"
    );
    Ok(buf)
}

pub(crate) fn decode(bytes: &[u8]) -> Result<RuleSet, DeserializeError> {
    let ruleset = serialized_to_ruleset(payload(bytes)?)?;
    tracing::debug!(rules = ruleset.len(), "decoded rule set");
    Ok(ruleset)
}

/// Whether `bytes` was encoded with a digest of exactly `source_text`.
/// A blob encoded without a source digest never matches.
pub(crate) fn source_matches(bytes: &[u8], source_text: &str) -> Result<bool, DeserializeError> {
    let digest = payload(bytes)?.metadata.source_digest;
    Ok(digest.is_some_and(|d| d == *blake3::hash(source_text.as_bytes()).as_bytes()))
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
