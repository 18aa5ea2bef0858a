//! `speakd merge-voices`.

use anyhow::Result;
use speakd_voice::{MergeSummary, load_voice, merge_voice_files, register_voice};

use crate::commands::MergeVoicesArgs;
use crate::error::CliError;

pub fn execute(args: &MergeVoicesArgs) -> Result<()> {
    let key = match &args.register {
        Some(_) => Some(args.voice_key().ok_or_else(|| {
            CliError::Arguments("cannot derive a voice key, pass --name".to_string())
        })?),
        None => None,
    };

    let summary = merge_voice_files(&args.voices, args.weights.as_deref(), &args.output)
        .map_err(CliError::from)?;
    println!("{}", describe(&summary));

    if let (Some(model_dir), Some(key)) = (&args.register, key) {
        let embedding = load_voice(&summary.output).map_err(CliError::from)?;
        let sid = register_voice(model_dir, &key, &embedding).map_err(CliError::from)?;
        println!(
            "Registered {key} as speaker {sid} in {}",
            model_dir.display()
        );
    }
    Ok(())
}

/// Human-readable summary of a merge.
pub fn describe(summary: &MergeSummary) -> String {
    let sources: Vec<String> = summary
        .inputs
        .iter()
        .enumerate()
        .map(|(i, path)| match &summary.weights {
            Some(weights) => format!("  {:.3}  {}", weights[i], path.display()),
            None => format!("  equal  {}", path.display()),
        })
        .collect();

    format!(
        "Merged {} voices into {} ({} values)\n{}",
        summary.inputs.len(),
        summary.output.display(),
        summary.values,
        sources.join("\n")
    )
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use speakd_voice::{SpeakerTable, save_voice};

    use super::*;

    #[test]
    fn test_execute_writes_merged_voice() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.bin");
        let b = dir.path().join("b.bin");
        save_voice(&a, &[1.0, 3.0]).unwrap();
        save_voice(&b, &[3.0, 5.0]).unwrap();

        let args = MergeVoicesArgs {
            voices: vec![a, b],
            weights: None,
            output: dir.path().join("out/merged.bin"),
            register: None,
            name: None,
        };
        execute(&args).unwrap();
        assert_eq!(load_voice(&args.output).unwrap(), vec![2.0, 4.0]);
    }

    #[test]
    fn test_rejected_weights_map_to_usage_error() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.bin");
        save_voice(&a, &[1.0]).unwrap();

        let args = MergeVoicesArgs {
            voices: vec![a.clone(), a],
            weights: Some(vec![0.9, 0.9]),
            output: dir.path().join("merged.bin"),
            register: None,
            name: None,
        };
        let err = execute(&args).unwrap_err();
        let cli_err = err.downcast_ref::<CliError>().unwrap();
        assert_eq!(cli_err.exit_code(), 2);
        assert!(!args.output.exists());
    }

    #[test]
    fn test_execute_registers_merged_voice() {
        let dir = tempfile::tempdir().unwrap();
        let model_dir = dir.path().join("kokoro");
        std::fs::create_dir_all(&model_dir).unwrap();
        std::fs::write(model_dir.join("speakers.txt"), "af_bella\nbm_george\n").unwrap();
        save_voice(&model_dir.join("voices.bin"), &[1.0, 1.0, 3.0, 3.0]).unwrap();

        let a = dir.path().join("a.bin");
        let b = dir.path().join("b.bin");
        save_voice(&a, &[1.0, 1.0]).unwrap();
        save_voice(&b, &[3.0, 3.0]).unwrap();

        let args = MergeVoicesArgs {
            voices: vec![a, b],
            weights: Some(vec![0.5, 0.5]),
            output: dir.path().join("bf_blend.bin"),
            register: Some(model_dir.clone()),
            name: None,
        };
        execute(&args).unwrap();

        let table = SpeakerTable::load(&model_dir).unwrap();
        assert!(table.has_voice("bf_blend"));
        assert_eq!(table.voices(), ["af_bella", "bm_george", "bf_blend"]);
        assert_eq!(
            load_voice(&model_dir.join("voices.bin")).unwrap(),
            vec![1.0, 1.0, 3.0, 3.0, 2.0, 2.0]
        );
    }

    #[test]
    fn test_describe_lists_weights() {
        let summary = MergeSummary {
            output: PathBuf::from("m.bin"),
            inputs: vec![PathBuf::from("a.bin"), PathBuf::from("b.bin")],
            weights: Some(vec![0.3, 0.7]),
            values: 256,
        };
        let text = describe(&summary);
        assert!(text.starts_with("Merged 2 voices into m.bin (256 values)"));
        assert!(text.contains("0.300  a.bin"));
        assert!(text.contains("0.700  b.bin"));
    }
}
