//! On-disk model artifact.
//!
//! Layout:
//!
//! ```text
//! [u32 LE header length][JSON header][bincode payload]
//! ```
//!
//! The header names the format (magic + version) and carries the payload
//! length and its BLAKE3 digest, so truncation and bit rot are caught before
//! the payload is decoded. The payload holds the [`ModelConfig`] and the
//! fitted (columns, scaler, forest) triple. Files are written to a temporary
//! sibling and renamed into place, so readers never see a partial artifact.

use std::io::Write;
use std::path::Path;

use credit_core::error::ModelError;
use serde::{Deserialize, Serialize};

use crate::config::ModelConfig;
use crate::model::FittedModel;

/// Magic string identifying a Credit Ledger model file.
pub const ARTIFACT_MAGIC: &str = "CLSM";

/// Current artifact format version.
pub const ARTIFACT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct ArtifactHeader {
    magic: String,
    version: u32,
    payload_len: u64,
    /// Hex-encoded BLAKE3 digest of the payload.
    checksum: String,
}

#[derive(bincode::Encode, bincode::Decode)]
struct ArtifactPayload {
    config: ModelConfig,
    fitted: FittedModel,
}

/// Serialize `config` and `fitted` into artifact bytes.
pub fn encode(config: &ModelConfig, fitted: &FittedModel) -> Result<Vec<u8>, ModelError> {
    let payload = ArtifactPayload {
        config: config.clone(),
        fitted: fitted.clone(),
    };
    let body = bincode::encode_to_vec(&payload, bincode::config::standard())
        .map_err(|e| ModelError::Serialization(e.to_string()))?;

    let header = ArtifactHeader {
        magic: ARTIFACT_MAGIC.to_string(),
        version: ARTIFACT_VERSION,
        payload_len: body.len() as u64,
        checksum: hex::encode(blake3::hash(&body).as_bytes()),
    };
    let header_json =
        serde_json::to_vec(&header).map_err(|e| ModelError::Serialization(e.to_string()))?;

    let mut out = Vec::with_capacity(4 + header_json.len() + body.len());
    out.extend_from_slice(&(header_json.len() as u32).to_le_bytes());
    out.extend_from_slice(&header_json);
    out.extend_from_slice(&body);
    Ok(out)
}

/// Parse artifact bytes produced by [`encode`].
pub fn decode(bytes: &[u8]) -> Result<(ModelConfig, FittedModel), ModelError> {
    let corrupt = |msg: String| ModelError::Deserialization(msg);

    let Some((len_bytes, rest)) = bytes.split_first_chunk::<4>() else {
        return Err(corrupt("file too short".into()));
    };
    let header_len = u32::from_le_bytes(*len_bytes) as usize;
    if rest.len() < header_len {
        return Err(corrupt("header truncated".into()));
    }
    let (header_json, body) = rest.split_at(header_len);

    let header: ArtifactHeader = serde_json::from_slice(header_json)
        .map_err(|e| corrupt(format!("invalid header: {e}")))?;
    if header.magic != ARTIFACT_MAGIC {
        return Err(corrupt("invalid magic".into()));
    }
    if header.version != ARTIFACT_VERSION {
        return Err(corrupt(format!("unsupported version: {}", header.version)));
    }
    if body.len() as u64 != header.payload_len {
        return Err(corrupt(format!(
            "payload length {} does not match header {}",
            body.len(),
            header.payload_len
        )));
    }
    if hex::encode(blake3::hash(body).as_bytes()) != header.checksum {
        return Err(corrupt("checksum mismatch".into()));
    }

    let (payload, read): (ArtifactPayload, usize) =
        bincode::decode_from_slice(body, bincode::config::standard())
            .map_err(|e| corrupt(format!("invalid payload: {e}")))?;
    if read != body.len() {
        return Err(corrupt("trailing bytes after payload".into()));
    }

    payload.config.validate().map_err(|e| corrupt(e.to_string()))?;
    payload.fitted.validate().map_err(corrupt)?;
    Ok((payload.config, payload.fitted))
}

/// Write the artifact to `path` atomically.
pub fn save(path: &Path, config: &ModelConfig, fitted: &FittedModel) -> Result<(), ModelError> {
    let bytes = encode(config, fitted)?;
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(|e| ModelError::Io(e.to_string()))?;
    tmp.write_all(&bytes).map_err(|e| ModelError::Io(e.to_string()))?;
    tmp.as_file().sync_all().map_err(|e| ModelError::Io(e.to_string()))?;
    tmp.persist(path).map_err(|e| ModelError::Io(e.error.to_string()))?;
    Ok(())
}

/// Read and validate the artifact at `path`.
pub fn load(path: &Path) -> Result<(ModelConfig, FittedModel), ModelError> {
    let bytes = std::fs::read(path).map_err(|e| ModelError::Io(e.to_string()))?;
    decode(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forest::RandomForest;
    use crate::scaler::StandardScaler;

    fn fitted() -> (ModelConfig, FittedModel) {
        let config = ModelConfig {
            n_estimators: 4,
            ..ModelConfig::default()
        };
        let x: Vec<Vec<f64>> = (0..30).map(|i| vec![i as f64, (i % 4) as f64]).collect();
        let y: Vec<f64> = (0..30).map(|i| (i * 30) as f64).collect();
        let scaler = StandardScaler::fit(&x).unwrap();
        let forest = RandomForest::fit(&scaler.transform(&x), &y, &config);
        let model = FittedModel {
            columns: vec!["a".into(), "b".into()],
            scaler,
            forest,
        };
        (config, model)
    }

    #[test]
    fn encode_decode_roundtrip() {
        let (config, model) = fitted();
        let bytes = encode(&config, &model).unwrap();
        let (c2, m2) = decode(&bytes).unwrap();
        assert_eq!(c2, config);
        assert_eq!(m2, model);
    }

    #[test]
    fn save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.clsm");
        let (config, model) = fitted();
        save(&path, &config, &model).unwrap();
        let (c2, m2) = load(&path).unwrap();
        assert_eq!(c2, config);
        assert_eq!(m2, model);
    }

    #[test]
    fn save_overwrites_and_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.clsm");
        let (config, model) = fitted();
        std::fs::write(&path, b"old").unwrap();
        save(&path, &config, &model).unwrap();
        assert!(load(&path).is_ok());
        let entries = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(decode(b"garbage"), Err(ModelError::Deserialization(_))));
        assert!(matches!(decode(&[0u8; 2]), Err(ModelError::Deserialization(_))));
        assert!(matches!(decode(&[]), Err(ModelError::Deserialization(_))));
    }

    #[test]
    fn flipped_payload_byte_fails_checksum() {
        let (config, model) = fitted();
        let mut bytes = encode(&config, &model).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        let err = decode(&bytes).unwrap_err();
        assert_eq!(err, ModelError::Deserialization("checksum mismatch".into()));
    }

    #[test]
    fn truncated_payload_is_rejected() {
        let (config, model) = fitted();
        let bytes = encode(&config, &model).unwrap();
        let err = decode(&bytes[..bytes.len() - 10]).unwrap_err();
        assert!(matches!(err, ModelError::Deserialization(m) if m.contains("payload length")));
    }

    fn with_header(header: &ArtifactHeader, body: &[u8]) -> Vec<u8> {
        let json = serde_json::to_vec(header).unwrap();
        let mut out = (json.len() as u32).to_le_bytes().to_vec();
        out.extend_from_slice(&json);
        out.extend_from_slice(body);
        out
    }

    #[test]
    fn wrong_magic_and_version_are_rejected() {
        let body = b"xyz";
        let checksum = hex::encode(blake3::hash(body).as_bytes());
        let bad_magic = ArtifactHeader {
            magic: "NOPE".into(),
            version: ARTIFACT_VERSION,
            payload_len: 3,
            checksum: checksum.clone(),
        };
        let err = decode(&with_header(&bad_magic, body)).unwrap_err();
        assert_eq!(err, ModelError::Deserialization("invalid magic".into()));

        let future = ArtifactHeader {
            magic: ARTIFACT_MAGIC.into(),
            version: ARTIFACT_VERSION + 1,
            payload_len: 3,
            checksum,
        };
        let err = decode(&with_header(&future, body)).unwrap_err();
        assert_eq!(err, ModelError::Deserialization("unsupported version: 2".into()));
    }

    #[test]
    fn valid_checksum_over_undecodable_payload_is_rejected() {
        let body = [0xFFu8; 16];
        let header = ArtifactHeader {
            magic: ARTIFACT_MAGIC.into(),
            version: ARTIFACT_VERSION,
            payload_len: body.len() as u64,
            checksum: hex::encode(blake3::hash(&body).as_bytes()),
        };
        let err = decode(&with_header(&header, &body)).unwrap_err();
        assert!(matches!(err, ModelError::Deserialization(_)));
    }

    #[test]
    fn inconsistent_triple_is_rejected() {
        let (config, mut model) = fitted();
        model.columns.push("extra".into());
        let bytes = encode(&config, &model).unwrap();
        let err = decode(&bytes).unwrap_err();
        assert!(matches!(err, ModelError::Deserialization(m) if m.contains("scaler")));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load(Path::new("/tmp/nonexistent_credit_ledger_model")).unwrap_err();
        assert!(matches!(err, ModelError::Io(_)));
    }
}
