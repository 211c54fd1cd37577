// ============================================================
// Layer 6 — Model Export Codec
// ============================================================
// Writes a trained next-word model as a pair of files the
// browser runtime can fetch cheaply, and reads them back.
//
//   <name>.json         metadata: config + vocab + weight file
//   <name>.weights.bin  the five tensors, back to back
//
// Weight blob layout (all little-endian, no padding):
//
//   for slot in [embedding, fc1_weight, fc1_bias, fc2_weight, fc2_bias]:
//       u32            rank
//       u32 × rank     extents, outer → inner
//       f32 × Π dims   values, row-major
//
// fc1_weight and fc2_weight are [d_out, d_in], so the browser
// reads W[o][i] at offset o * d_in + i.
//
// There is no magic number, version or checksum: the reader
// knows the slot order and checks every declared shape against
// the metadata config, aborting on the first disagreement.
//
// The JSON-only variant (`<name>.json` with inline nested
// `weights`) is larger but self-contained; the loader accepts
// either form.
//
// Reference: byteorder crate documentation

use anyhow::{Context, Result};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::{Deserialize, Serialize};
use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, Read, Write},
    path::{Path, PathBuf},
};
use thiserror::Error;

use crate::domain::model_spec::{ModelConfig, ModelParameters, ParamSlot, ParamTensor, Vocabulary};

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("tensor '{slot}': declared rank {got}, model expects {expected}")]
    RankMismatch { slot: &'static str, expected: usize, got: usize },

    #[error("tensor '{slot}': declared shape {got:?}, model expects {expected:?}")]
    ShapeMismatch { slot: &'static str, expected: Vec<usize>, got: Vec<usize> },

    #[error("tensor '{slot}': {got} values for shape {shape:?}")]
    DataLength { slot: &'static str, shape: Vec<usize>, got: usize },

    #[error("{0} unexpected trailing bytes after the last tensor")]
    TrailingBytes(usize),

    #[error("metadata names no weight file and carries no inline weights")]
    MissingWeights,

    #[error("vocabulary has {got} entries, config declares {expected}")]
    VocabSize { expected: usize, got: usize },
}

/// Which artifact layout `export_model` writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// `<name>.json` metadata + `<name>.weights.bin`
    Binary,
    /// Single `<name>.json` with inline weights
    Json,
}

/// Everything needed to rebuild a model for inference.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelArtifact {
    pub config: ModelConfig,
    pub vocab:  Vocabulary,
    pub params: ModelParameters,
}

/// `<name>.json` in the binary layout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetadata {
    pub config:       ModelConfig,
    pub vocab:        Vocabulary,
    pub weight_files: Vec<String>,
}

/// Nested-array weights for the JSON-only layout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InlineWeights {
    pub embedding:  Vec<Vec<f32>>,
    pub fc1_weight: Vec<Vec<f32>>,
    pub fc1_bias:   Vec<f32>,
    pub fc2_weight: Vec<Vec<f32>>,
    pub fc2_bias:   Vec<f32>,
}

#[derive(Serialize)]
struct JsonModelDocument<'a> {
    config:  &'a ModelConfig,
    weights: InlineWeights,
    vocab:   &'a Vocabulary,
}

/// Either layout, for reading
#[derive(Deserialize)]
struct ModelDocument {
    config: ModelConfig,
    vocab:  Vocabulary,
    #[serde(default)]
    weight_files: Vec<String>,
    #[serde(default)]
    weights: Option<InlineWeights>,
}

/// Paths and sizes of what `export_model` wrote
#[derive(Debug, Clone)]
pub struct ExportReport {
    pub files: Vec<(PathBuf, u64)>,
}

impl ExportReport {
    pub fn total_bytes(&self) -> u64 {
        self.files.iter().map(|(_, n)| n).sum()
    }
}

pub fn metadata_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}.json"))
}

pub fn weights_file_name(name: &str) -> String {
    format!("{name}.weights.bin")
}

// ─── Binary blob ──────────────────────────────────────────────────────────────

fn write_tensor<W: Write>(w: &mut W, slot: ParamSlot, t: &ParamTensor) -> Result<(), CodecError> {
    if t.data.len() != t.numel() {
        return Err(CodecError::DataLength { slot: slot.name(), shape: t.shape.clone(), got: t.data.len() });
    }
    w.write_u32::<LittleEndian>(t.shape.len() as u32)?;
    for &d in &t.shape {
        w.write_u32::<LittleEndian>(d as u32)?;
    }
    for &v in &t.data {
        w.write_f32::<LittleEndian>(v)?;
    }
    Ok(())
}

/// Write all five tensors in slot order.
pub fn write_weights<W: Write>(w: &mut W, params: &ModelParameters) -> Result<(), CodecError> {
    for (slot, t) in params.iter() {
        write_tensor(w, slot, t)?;
    }
    Ok(())
}

fn read_tensor<R: Read>(r: &mut R, slot: ParamSlot, expected: Vec<usize>) -> Result<ParamTensor, CodecError> {
    let rank = r.read_u32::<LittleEndian>()? as usize;
    if rank != expected.len() {
        return Err(CodecError::RankMismatch { slot: slot.name(), expected: expected.len(), got: rank });
    }

    let mut shape = Vec::with_capacity(rank);
    for _ in 0..rank {
        shape.push(r.read_u32::<LittleEndian>()? as usize);
    }
    if shape != expected {
        return Err(CodecError::ShapeMismatch { slot: slot.name(), expected, got: shape });
    }

    let mut data = vec![0f32; shape.iter().product()];
    r.read_f32_into::<LittleEndian>(&mut data)?;
    Ok(ParamTensor::new(shape, data))
}

/// Read the five tensors, checking each declared shape against `config`.
/// Bytes left over after the last tensor are an error.
pub fn read_weights<R: Read>(r: &mut R, config: &ModelConfig) -> Result<ModelParameters, CodecError> {
    let mut tensors = Vec::with_capacity(ParamSlot::ORDER.len());
    for slot in ParamSlot::ORDER {
        tensors.push(read_tensor(r, slot, config.shape_of(slot))?);
    }

    let mut rest = Vec::new();
    let extra = r.read_to_end(&mut rest)?;
    if extra > 0 {
        return Err(CodecError::TrailingBytes(extra));
    }

    let tensors: [ParamTensor; 5] = tensors
        .try_into()
        .map_err(|_| CodecError::MissingWeights)?;
    Ok(ModelParameters::from_ordered(tensors))
}

// ─── Inline JSON weights ──────────────────────────────────────────────────────

fn to_rows(t: &ParamTensor) -> Vec<Vec<f32>> {
    let cols = t.shape.get(1).copied().unwrap_or(1).max(1);
    t.data.chunks(cols).map(|c| c.to_vec()).collect()
}

fn from_rows(slot: ParamSlot, rows: Vec<Vec<f32>>, expected: Vec<usize>) -> Result<ParamTensor, CodecError> {
    let cols = rows.first().map_or(0, Vec::len);
    if rows.iter().any(|r| r.len() != cols) {
        return Err(CodecError::ShapeMismatch { slot: slot.name(), expected, got: vec![rows.len()] });
    }
    let shape = vec![rows.len(), cols];
    if shape != expected {
        return Err(CodecError::ShapeMismatch { slot: slot.name(), expected, got: shape });
    }
    Ok(ParamTensor::new(shape, rows.into_iter().flatten().collect()))
}

fn from_vector(slot: ParamSlot, values: Vec<f32>, expected: Vec<usize>) -> Result<ParamTensor, CodecError> {
    let shape = vec![values.len()];
    if shape != expected {
        return Err(CodecError::ShapeMismatch { slot: slot.name(), expected, got: shape });
    }
    Ok(ParamTensor::new(shape, values))
}

impl InlineWeights {
    pub fn from_params(p: &ModelParameters) -> Self {
        Self {
            embedding:  to_rows(&p.embedding),
            fc1_weight: to_rows(&p.fc1_weight),
            fc1_bias:   p.fc1_bias.data.clone(),
            fc2_weight: to_rows(&p.fc2_weight),
            fc2_bias:   p.fc2_bias.data.clone(),
        }
    }

    pub fn into_params(self, config: &ModelConfig) -> Result<ModelParameters, CodecError> {
        use ParamSlot::*;
        Ok(ModelParameters {
            embedding:  from_rows(Embedding, self.embedding, config.shape_of(Embedding))?,
            fc1_weight: from_rows(Fc1Weight, self.fc1_weight, config.shape_of(Fc1Weight))?,
            fc1_bias:   from_vector(Fc1Bias, self.fc1_bias, config.shape_of(Fc1Bias))?,
            fc2_weight: from_rows(Fc2Weight, self.fc2_weight, config.shape_of(Fc2Weight))?,
            fc2_bias:   from_vector(Fc2Bias, self.fc2_bias, config.shape_of(Fc2Bias))?,
        })
    }
}

// ─── Files ────────────────────────────────────────────────────────────────────

/// Write `artifact` under `dir` as `name`, overwriting earlier exports.
pub fn export_model(
    dir:      &Path,
    name:     &str,
    artifact: &ModelArtifact,
    format:   ExportFormat,
) -> Result<ExportReport> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Cannot create '{}'", dir.display()))?;

    let meta_path = metadata_path(dir, name);
    let mut files = Vec::new();

    match format {
        ExportFormat::Binary => {
            let bin_name = weights_file_name(name);
            let bin_path = dir.join(&bin_name);

            let metadata = ModelMetadata {
                config:       artifact.config,
                vocab:        artifact.vocab.clone(),
                weight_files: vec![bin_name],
            };
            write_json(&meta_path, &metadata)?;

            let file = File::create(&bin_path)
                .with_context(|| format!("Cannot create '{}'", bin_path.display()))?;
            let mut w = BufWriter::new(file);
            write_weights(&mut w, &artifact.params)
                .with_context(|| format!("Cannot write weights to '{}'", bin_path.display()))?;
            w.flush()?;

            files.push((meta_path.clone(), file_size(&meta_path)?));
            files.push((bin_path.clone(), file_size(&bin_path)?));
        }
        ExportFormat::Json => {
            let doc = JsonModelDocument {
                config:  &artifact.config,
                weights: InlineWeights::from_params(&artifact.params),
                vocab:   &artifact.vocab,
            };
            write_json(&meta_path, &doc)?;
            files.push((meta_path.clone(), file_size(&meta_path)?));
        }
    }

    let report = ExportReport { files };
    for (path, size) in &report.files {
        tracing::info!("  {}: {} KB", path.display(), size / 1024);
    }
    tracing::info!("  Total: {} KB", report.total_bytes() / 1024);
    Ok(report)
}

/// Read `<dir>/<name>.json` and its weights in whichever layout it uses.
pub fn load_model(dir: &Path, name: &str) -> Result<ModelArtifact> {
    let meta_path = metadata_path(dir, name);
    let file = File::open(&meta_path)
        .with_context(|| format!("Cannot open model metadata '{}'", meta_path.display()))?;
    let doc: ModelDocument = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("Malformed model metadata '{}'", meta_path.display()))?;

    if doc.vocab.len() != doc.config.vocab_size {
        return Err(CodecError::VocabSize { expected: doc.config.vocab_size, got: doc.vocab.len() })
            .with_context(|| format!("In '{}'", meta_path.display()));
    }

    let params = match (doc.weights, doc.weight_files.first()) {
        (Some(inline), _) => inline
            .into_params(&doc.config)
            .with_context(|| format!("Bad inline weights in '{}'", meta_path.display()))?,
        (None, Some(bin_name)) => {
            let base     = meta_path.parent().unwrap_or(dir);
            let bin_path = base.join(bin_name);
            let file = File::open(&bin_path)
                .with_context(|| format!("Cannot open weights '{}'", bin_path.display()))?;
            read_weights(&mut BufReader::new(file), &doc.config)
                .with_context(|| format!("Bad weight blob '{}'", bin_path.display()))?
        }
        (None, None) => {
            return Err(CodecError::MissingWeights)
                .with_context(|| format!("In '{}'", meta_path.display()));
        }
    };

    tracing::debug!("Loaded model '{}' ({:?})", name, doc.config);
    Ok(ModelArtifact { config: doc.config, vocab: doc.vocab, params })
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Cannot create '{}'", path.display()))?;
    let mut w = BufWriter::new(file);
    serde_json::to_writer(&mut w, value)
        .with_context(|| format!("Cannot write '{}'", path.display()))?;
    w.flush()?;
    Ok(())
}

fn file_size(path: &Path) -> Result<u64> {
    Ok(fs::metadata(path)
        .with_context(|| format!("Cannot stat '{}'", path.display()))?
        .len())
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ModelConfig {
        ModelConfig { vocab_size: 7, embed_dim: 3, context_len: 2, hidden_dim: 5 }
    }

    /// Deterministic, non-trivial values including negatives and subnormal-ish
    fn params_for(c: &ModelConfig) -> ModelParameters {
        let mut counter = 0u32;
        ModelParameters::from_ordered(ParamSlot::ORDER.map(|slot| {
            let shape = c.shape_of(slot);
            let n: usize = shape.iter().product();
            let data = (0..n)
                .map(|_| {
                    counter += 1;
                    ((counter as f32) * 0.37).sin() * 1.0e-3_f32.powi((counter % 3) as i32)
                })
                .collect();
            ParamTensor::new(shape, data)
        }))
    }

    fn encode_weights(params: &ModelParameters) -> Result<Vec<u8>, CodecError> {
        let mut buf = Vec::new();
        write_weights(&mut buf, params)?;
        Ok(buf)
    }

    fn artifact() -> ModelArtifact {
        let c = config();
        ModelArtifact {
            config: c,
            vocab:  Vocabulary::new((0..c.vocab_size).map(|i| format!("tok{i}")).collect()),
            params: params_for(&c),
        }
    }

    #[test]
    fn test_blob_layout_is_rank_dims_then_f32s() {
        let c = ModelConfig { vocab_size: 2, embed_dim: 1, context_len: 1, hidden_dim: 1 };
        let mut p = params_for(&c);
        p.embedding.data = vec![1.5, -2.0];
        let bytes = encode_weights(&p).unwrap();

        assert_eq!(&bytes[0..4],   &2u32.to_le_bytes());
        assert_eq!(&bytes[4..8],   &2u32.to_le_bytes());
        assert_eq!(&bytes[8..12],  &1u32.to_le_bytes());
        assert_eq!(&bytes[12..16], &1.5f32.to_le_bytes());
        assert_eq!(&bytes[16..20], &(-2.0f32).to_le_bytes());
        // next tensor (fc1_weight [1, 1]) starts right after, no padding
        assert_eq!(&bytes[20..24], &2u32.to_le_bytes());

        // 5 tensors: (1+2)*4+2*4, (1+2)*4+4, (1+1)*4+4, (1+2)*4+2*4, (1+1)*4+2*4
        assert_eq!(bytes.len(), 20 + 16 + 12 + 20 + 16);
        // fc2_weight declares [vocab_size, hidden_dim] = [2, 1]
        assert_eq!(&bytes[48..52], &2u32.to_le_bytes());
        assert_eq!(&bytes[52..56], &2u32.to_le_bytes());
        assert_eq!(&bytes[56..60], &1u32.to_le_bytes());
    }

    #[test]
    fn test_binary_round_trip_is_bit_identical() {
        let dir = tempfile::tempdir().unwrap();
        let a   = artifact();
        export_model(dir.path(), "m", &a, ExportFormat::Binary).unwrap();

        assert!(dir.path().join("m.json").exists());
        assert!(dir.path().join("m.weights.bin").exists());

        let loaded = load_model(dir.path(), "m").unwrap();
        assert_eq!(loaded.config, a.config);
        assert_eq!(loaded.vocab, a.vocab);
        for (slot, t) in a.params.iter() {
            let got = loaded.params.get(slot);
            assert_eq!(got.shape, t.shape);
            let same_bits = got.data.iter().zip(&t.data).all(|(x, y)| x.to_bits() == y.to_bits());
            assert!(same_bits, "slot {}", slot.name());
        }
    }

    #[test]
    fn test_metadata_document_fields() {
        let dir = tempfile::tempdir().unwrap();
        export_model(dir.path(), "next-word-ctx2", &artifact(), ExportFormat::Binary).unwrap();
        let text = fs::read_to_string(dir.path().join("next-word-ctx2.json")).unwrap();
        let v: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(v["config"]["vocab_size"], 7);
        assert_eq!(v["config"]["hidden_dim"], 5);
        assert_eq!(v["vocab"][3], "tok3");
        assert_eq!(v["weight_files"][0], "next-word-ctx2.weights.bin");
    }

    #[test]
    fn test_export_twice_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let a   = artifact();
        export_model(dir.path(), "m", &a, ExportFormat::Binary).unwrap();
        let first = fs::read(dir.path().join("m.weights.bin")).unwrap();
        export_model(dir.path(), "m", &a, ExportFormat::Binary).unwrap();
        let second = fs::read(dir.path().join("m.weights.bin")).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, encode_weights(&a.params).unwrap());
    }

    #[test]
    fn test_shape_mismatch_aborts() {
        let bytes = encode_weights(&params_for(&config())).unwrap();
        let wider = ModelConfig { hidden_dim: 6, ..config() };
        let err = read_weights(&mut bytes.as_slice(), &wider).unwrap_err();
        assert!(matches!(err, CodecError::ShapeMismatch { slot: "fc1_weight", .. }), "{err}");
    }

    #[test]
    fn test_rank_mismatch_aborts() {
        let mut bytes = encode_weights(&params_for(&config())).unwrap();
        bytes[0..4].copy_from_slice(&3u32.to_le_bytes());
        let err = read_weights(&mut bytes.as_slice(), &config()).unwrap_err();
        assert!(matches!(err, CodecError::RankMismatch { slot: "embedding", expected: 2, got: 3 }));
    }

    #[test]
    fn test_truncated_blob_is_io_error() {
        let bytes = encode_weights(&params_for(&config())).unwrap();
        let cut   = &bytes[..bytes.len() - 4];
        let err   = read_weights(&mut &cut[..], &config()).unwrap_err();
        assert!(matches!(err, CodecError::Io(_)));
    }

    #[test]
    fn test_trailing_bytes_are_rejected() {
        let mut bytes = encode_weights(&params_for(&config())).unwrap();
        bytes.extend_from_slice(&[0, 0, 0, 0]);
        let err = read_weights(&mut bytes.as_slice(), &config()).unwrap_err();
        assert!(matches!(err, CodecError::TrailingBytes(4)));
    }

    #[test]
    fn test_json_variant_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let a   = artifact();
        export_model(dir.path(), "inline", &a, ExportFormat::Json).unwrap();
        assert!(!dir.path().join("inline.weights.bin").exists());
        let loaded = load_model(dir.path(), "inline").unwrap();
        assert_eq!(loaded, a);
    }

    #[test]
    fn test_vocab_size_must_match_config() {
        let dir = tempfile::tempdir().unwrap();
        let mut a = artifact();
        a.vocab = Vocabulary::new(vec!["only".into()]);
        export_model(dir.path(), "bad", &a, ExportFormat::Binary).unwrap();
        assert!(load_model(dir.path(), "bad").is_err());
    }

    #[test]
    fn test_missing_weight_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        export_model(dir.path(), "m", &artifact(), ExportFormat::Binary).unwrap();
        fs::remove_file(dir.path().join("m.weights.bin")).unwrap();
        assert!(load_model(dir.path(), "m").is_err());
    }
}
