//! The environment-driven generator process boundary

mod common;

use common::regex;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use tree_guide::config::{INPUT_FILE_VAR, OUTPUT_FILE_VAR};
use tree_guide::{
    parse_choices_str, DefaultGuide, GeneratorEnv, GuideConfig, GuideError, SaverGuide, SyncMode,
};

fn env_for(input: &Path, output: Option<&Path>) -> GeneratorEnv {
    let mut vars = HashMap::new();
    vars.insert(INPUT_FILE_VAR, input.display().to_string());
    if let Some(output) = output {
        vars.insert(OUTPUT_FILE_VAR, output.display().to_string());
    }
    GeneratorEnv::from_vars(|name| vars.get(name).cloned()).unwrap()
}

/// Record one regex and write it the way a generator process would
fn write_recorded(dir: &TempDir, name: &str, depth: u64) -> (std::path::PathBuf, String) {
    let mut saver = SaverGuide::new(DefaultGuide::new(depth));
    let mut chooser = saver.chooser().unwrap().unwrap();
    let generated = regex(&mut chooser, depth);
    let path = dir.path().join(name);
    fs::write(&path, format!("{}\n{}", generated, chooser.format_choices())).unwrap();
    (path, generated)
}

#[test]
fn test_replays_input_and_writes_artifact() {
    let dir = TempDir::new().unwrap();
    let (input, generated) = write_recorded(&dir, "input.txt", 6);
    let output = dir.path().join("output.txt");
    let env = env_for(&input, Some(&output));

    let artifact = env
        .run(&GuideConfig::default(), |c| regex(c, 6))
        .unwrap();

    let written = fs::read_to_string(&output).unwrap();
    assert_eq!(written, artifact);
    assert!(written.starts_with(&format!("{}\n", generated)));
    // the artifact is itself a valid input
    assert_eq!(written, fs::read_to_string(&input).unwrap());
}

#[test]
fn test_output_can_be_fed_back_in() {
    let dir = TempDir::new().unwrap();
    let (input, _) = write_recorded(&dir, "first.txt", 8);
    let second = dir.path().join("second.txt");
    let third = dir.path().join("third.txt");
    let config = GuideConfig {
        sync: SyncMode::Balance,
        ..GuideConfig::default()
    };

    // a generator with a shallower recursion limit than the recording
    env_for(&input, Some(&second)).run(&config, |c| regex(c, 4)).unwrap();
    let again = env_for(&second, Some(&third))
        .run(&config, |c| regex(c, 4))
        .unwrap();
    assert_eq!(fs::read_to_string(&second).unwrap(), again);
}

#[test]
fn test_prefix_override_must_match_input() {
    let dir = TempDir::new().unwrap();
    let (input, _) = write_recorded(&dir, "input.txt", 3);
    let config = GuideConfig::default()
        .with_overrides(|name| (name == "TREE_GUIDE_PREFIX").then(|| "# ".to_string()))
        .unwrap();
    let result = env_for(&input, None).run(&config, |c| regex(c, 3));
    // line 1 is the artifact, line 2 the begin marker
    assert!(matches!(result, Err(GuideError::MalformedLog { line: 3, .. })));
}

#[test]
fn test_missing_input_is_an_io_error() {
    let dir = TempDir::new().unwrap();
    let env = env_for(&dir.path().join("absent.txt"), None);
    let result = env.run(&GuideConfig::default(), |c| regex(c, 3));
    assert!(matches!(result, Err(GuideError::Io(_))));
}

#[test]
fn test_malformed_input_is_rejected() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("bad.txt");
    fs::write(&input, "// BEGIN FORMATTED CHOICES\n// 1,x,2,\n// END FORMATTED CHOICES\n").unwrap();
    let result = env_for(&input, None).run(&GuideConfig::default(), |c| regex(c, 3));
    assert!(matches!(result, Err(GuideError::MalformedLog { line: 2, .. })));
}

#[test]
fn test_artifact_ends_with_the_choices_actually_made() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("short.txt");
    fs::write(&input, "// BEGIN FORMATTED CHOICES\n// 4,\n// END FORMATTED CHOICES\n").unwrap();
    let artifact = env_for(&input, None)
        .run(&GuideConfig::default(), |c| format!("{} {}", c.choose(10), c.choose(10)))
        .unwrap();
    let recs = parse_choices_str(&artifact, "// ").unwrap();
    assert_eq!(recs.len(), 2);
    assert!(artifact.starts_with("4 "));
}
