//! Voice embedding files and the offline merge utility.
//!
//! A voice file is a flat little-endian `f32` array, the same layout as the
//! per-voice `.bin` style tensors shipped with Kokoro.

use std::path::{Path, PathBuf};

use speakd_core::{merge_embeddings, validate_weights};

use crate::error::VoiceError;

/// Outcome of [`merge_voice_files`].
#[derive(Debug, Clone, PartialEq)]
pub struct MergeSummary {
    pub output: PathBuf,
    pub inputs: Vec<PathBuf>,
    pub weights: Option<Vec<f32>>,
    /// Number of `f32` values in the merged embedding.
    pub values: usize,
}

/// Read a voice embedding.
pub fn load_voice(path: &Path) -> Result<Vec<f32>, VoiceError> {
    let bytes = std::fs::read(path)?;
    if bytes.is_empty() || bytes.len() % 4 != 0 {
        return Err(VoiceError::InvalidVoiceFile {
            path: path.to_path_buf(),
            message: format!("length {} is not a positive multiple of 4", bytes.len()),
        });
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

/// Write a voice embedding, creating parent directories as needed.
pub fn save_voice(path: &Path, embedding: &[f32]) -> Result<(), VoiceError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let bytes: Vec<u8> = embedding.iter().flat_map(|v| v.to_le_bytes()).collect();
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Merge voice files into `output`.
///
/// Weights are checked and every input is confirmed to exist before
/// anything is read, so a rejected invocation leaves `output` untouched.
pub fn merge_voice_files(
    inputs: &[PathBuf],
    weights: Option<&[f32]>,
    output: &Path,
) -> Result<MergeSummary, VoiceError> {
    validate_weights(inputs.len(), weights)?;

    if let Some(missing) = inputs.iter().find(|p| !p.exists()) {
        return Err(VoiceError::ModelNotFound(missing.clone()));
    }

    let embeddings = inputs
        .iter()
        .map(|p| load_voice(p))
        .collect::<Result<Vec<_>, _>>()?;
    let merged = merge_embeddings(&embeddings, weights)?;

    save_voice(output, &merged)?;

    tracing::info!(
        output = %output.display(),
        inputs = inputs.len(),
        weighted = weights.is_some(),
        "Merged voices"
    );

    Ok(MergeSummary {
        output: output.to_path_buf(),
        inputs: inputs.to_vec(),
        weights: weights.map(<[f32]>::to_vec),
        values: merged.len(),
    })
}

#[cfg(test)]
mod tests {
    use speakd_core::MergeError;

    use super::*;

    fn write_voice(dir: &Path, name: &str, values: &[f32]) -> PathBuf {
        let path = dir.join(name);
        save_voice(&path, values).unwrap();
        path
    }

    #[test]
    fn test_load_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_voice(dir.path(), "v/af_test.bin", &[1.5, -2.0, 0.0]);
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 12);
        assert_eq!(load_voice(&path).unwrap(), vec![1.5, -2.0, 0.0]);
    }

    #[test]
    fn test_load_rejects_truncated_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.bin");
        std::fs::write(&path, [0u8; 6]).unwrap();
        assert!(matches!(
            load_voice(&path),
            Err(VoiceError::InvalidVoiceFile { .. })
        ));
    }

    #[test]
    fn test_weighted_merge_writes_output() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_voice(dir.path(), "a.bin", &[1.0, 0.0]);
        let b = write_voice(dir.path(), "b.bin", &[0.0, 1.0]);
        let out = dir.path().join("merged.bin");

        let summary = merge_voice_files(&[a, b], Some(&[0.25, 0.75]), &out).unwrap();
        assert_eq!(summary.values, 2);
        assert_eq!(load_voice(&out).unwrap(), vec![0.25, 0.75]);
    }

    #[test]
    fn test_unweighted_merge_is_mean() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_voice(dir.path(), "a.bin", &[2.0, 4.0]);
        let b = write_voice(dir.path(), "b.bin", &[4.0, 8.0]);
        let out = dir.path().join("merged.bin");

        merge_voice_files(&[a, b], None, &out).unwrap();
        assert_eq!(load_voice(&out).unwrap(), vec![3.0, 6.0]);
    }

    #[test]
    fn test_bad_weights_write_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_voice(dir.path(), "a.bin", &[1.0]);
        let b = write_voice(dir.path(), "b.bin", &[2.0]);
        let out = dir.path().join("merged.bin");

        let err = merge_voice_files(&[a.clone(), b.clone()], Some(&[0.5, 0.6]), &out).unwrap_err();
        assert!(matches!(
            err,
            VoiceError::Merge(MergeError::WeightsDoNotSumToOne(_))
        ));

        let err = merge_voice_files(&[a, b], Some(&[1.0]), &out).unwrap_err();
        assert!(matches!(
            err,
            VoiceError::Merge(MergeError::WeightCountMismatch { .. })
        ));
        assert!(!out.exists());
    }

    #[test]
    fn test_missing_input_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_voice(dir.path(), "a.bin", &[1.0]);
        let out = dir.path().join("merged.bin");

        let err = merge_voice_files(&[a, dir.path().join("nope.bin")], None, &out).unwrap_err();
        assert!(matches!(err, VoiceError::ModelNotFound(_)));
        assert!(!out.exists());
    }
}
