use std::{fs, path::PathBuf};

use tempfile::tempdir;

use trellis_cli::{Args, run};

/// Collects all .er files from a directory
fn collect_er_files(dir: PathBuf) -> Vec<PathBuf> {
    let mut files = if let Ok(entries) = fs::read_dir(&dir) {
        entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("er")
            })
            .collect()
    } else {
        Vec::new()
    };

    // Sort for consistent test output
    files.sort();
    files
}

fn demos_dir() -> PathBuf {
    // Demos are at the workspace root, relative to the workspace not the crate
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("demos")
}

#[test]
fn e2e_smoke_test_valid_demos() {
    let temp_dir = tempdir().expect("Failed to create temp directory");

    let valid_demos = collect_er_files(demos_dir());
    assert!(!valid_demos.is_empty(), "No valid demos found in demos/");

    let mut failed = Vec::new();

    for demo_path in &valid_demos {
        let output_filename =
            format!("{}.dot", demo_path.file_stem().unwrap().to_string_lossy());
        let output_path = temp_dir.path().join(output_filename);

        let args = Args {
            input: Some(demo_path.to_string_lossy().to_string()),
            output: Some(output_path.to_string_lossy().to_string()),
            config: None,
            log_level: "off".to_string(),
        };

        match run(&args) {
            Err(e) => failed.push((demo_path.clone(), e.to_string())),
            Ok(()) => {
                let dot = fs::read_to_string(&output_path).unwrap();
                assert!(dot.contains("graph"), "{}: empty output", demo_path.display());
            }
        }
    }

    if !failed.is_empty() {
        eprintln!("\nValid demos that failed:");
        for (path, err) in &failed {
            eprintln!("  - {}: {}", path.display(), err);
        }
        panic!("{} valid demo(s) failed unexpectedly", failed.len());
    }
}

#[test]
fn e2e_smoke_test_error_demos() {
    let temp_dir = tempdir().expect("Failed to create temp directory");

    let error_demos = collect_er_files(demos_dir().join("errors"));
    assert!(
        !error_demos.is_empty(),
        "No error demos found in demos/errors/"
    );

    let mut unexpectedly_succeeded = Vec::new();

    for demo_path in &error_demos {
        let output_filename = format!(
            "error_{}.dot",
            demo_path.file_stem().unwrap().to_string_lossy()
        );
        let output_path = temp_dir.path().join(output_filename);

        let args = Args {
            input: Some(demo_path.to_string_lossy().to_string()),
            output: Some(output_path.to_string_lossy().to_string()),
            config: None,
            log_level: "off".to_string(),
        };

        if run(&args).is_ok() {
            unexpectedly_succeeded.push(demo_path.clone());
        }
    }

    if !unexpectedly_succeeded.is_empty() {
        eprintln!("\nError demos that unexpectedly succeeded:");
        for path in &unexpectedly_succeeded {
            eprintln!("  - {}", path.display());
        }
        panic!(
            "{} error demo(s) succeeded unexpectedly",
            unexpectedly_succeeded.len()
        );
    }
}
