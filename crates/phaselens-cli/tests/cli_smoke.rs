use std::process::{Command, Output};
use std::sync::Mutex;

use tempfile::tempdir;

// Tests write executable scripts; keep forks from other tests out of the
// window where a script's write fd is still open.
static SERIAL: Mutex<()> = Mutex::new(());

fn phaselens(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_phaselens"))
        .args(args)
        .env_remove("PHASELENS_COMPILER")
        .env_remove("PHASELENS_TIMEOUT_SECS")
        .env_remove("PHASELENS_SOURCE_SUFFIX")
        .env_remove("PHASELENS_ARTIFACT_DIR")
        .output()
        .unwrap()
}

const CAPTURED: &str = "\
==============================
 Phase: Semantic Analysis
==============================
A
==============================
 Phase: Code Generation
==============================
B
";

#[test]
fn interpret_prints_channels() {
    let _guard = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
    let dir = tempdir().unwrap();
    let stdout_path = dir.path().join("stdout.txt");
    std::fs::write(&stdout_path, CAPTURED).unwrap();

    let out = phaselens(&["interpret", "--stdout", stdout_path.to_str().unwrap()]);
    assert!(out.status.success());
    let text = String::from_utf8(out.stdout).unwrap();
    assert_eq!(text, "=== Semantic ===\nA\n\n=== CodeGen ===\nB\n");
}

#[test]
fn interpret_json_single_channel() {
    let _guard = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
    let dir = tempdir().unwrap();
    let stdout_path = dir.path().join("stdout.txt");
    std::fs::write(&stdout_path, CAPTURED).unwrap();

    let out = phaselens(&[
        "interpret",
        "--stdout",
        stdout_path.to_str().unwrap(),
        "--channel",
        "codegen",
        "--json",
    ]);
    assert!(out.status.success());
    let value: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(value["channel"], "codegen");
    assert_eq!(value["text"], "B");
}

#[test]
fn interpret_json_prints_whole_model() {
    let _guard = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
    let dir = tempdir().unwrap();
    let stdout_path = dir.path().join("stdout.txt");
    std::fs::write(&stdout_path, CAPTURED).unwrap();

    let out = phaselens(&["interpret", "--stdout", stdout_path.to_str().unwrap(), "--json"]);
    assert!(out.status.success());
    let value: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(value["kind"], "phase_report");
    assert_eq!(value["channels"]["semantic"], "A");
    assert_eq!(value["channels"]["codegen"], "B");
}

#[test]
fn log_json_keeps_text_output() {
    let _guard = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
    let dir = tempdir().unwrap();
    let stdout_path = dir.path().join("stdout.txt");
    std::fs::write(&stdout_path, CAPTURED).unwrap();

    let out = phaselens(&["--log-json", "interpret", "--stdout", stdout_path.to_str().unwrap()]);
    assert!(out.status.success());
    assert_eq!(
        String::from_utf8(out.stdout).unwrap(),
        "=== Semantic ===\nA\n\n=== CodeGen ===\nB\n"
    );
}

#[test]
fn interpret_crash_exits_nonzero() {
    let _guard = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
    let dir = tempdir().unwrap();
    let stdout_path = dir.path().join("stdout.txt");
    let stderr_path = dir.path().join("stderr.txt");
    std::fs::write(&stdout_path, CAPTURED).unwrap();
    std::fs::write(&stderr_path, "Segmentation fault\n").unwrap();

    let out = phaselens(&[
        "interpret",
        "--stdout",
        stdout_path.to_str().unwrap(),
        "--stderr",
        stderr_path.to_str().unwrap(),
    ]);
    assert_eq!(out.status.code(), Some(1));
    assert!(out.stdout.is_empty());
    let err = String::from_utf8(out.stderr).unwrap();
    assert!(err.contains("Compiler Error:\nSegmentation fault"));
    assert!(err.contains("Compiler Crash:\nThe compiler crashed with a Segmentation Fault."));
}

#[test]
fn channels_lists_every_channel() {
    let _guard = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
    let out = phaselens(&["channels"]);
    assert!(out.status.success());
    let text = String::from_utf8(out.stdout).unwrap();
    for label in ["Lexical", "Syntax", "Semantic", "IR", "Optimization", "CodeGen"] {
        assert!(text.contains(label), "missing {label} in {text}");
    }
    assert!(text.contains("Intermediate Representation (IR)"));
}

#[test]
fn compile_with_missing_compiler_exits_2() {
    let _guard = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
    let dir = tempdir().unwrap();
    let source = dir.path().join("main.mylang");
    std::fs::write(&source, "publish(\"taniya\");").unwrap();
    let missing = dir.path().join("no-compiler");

    let out = phaselens(&[
        "compile",
        source.to_str().unwrap(),
        "--compiler",
        missing.to_str().unwrap(),
    ]);
    assert_eq!(out.status.code(), Some(2));
    let err = String::from_utf8(out.stderr).unwrap();
    assert!(err.contains("not found"), "{err}");
}

#[cfg(unix)]
#[test]
fn compile_runs_compiler_script() {
    use std::os::unix::fs::PermissionsExt;

    let _guard = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
    let dir = tempdir().unwrap();
    let source = dir.path().join("main.mylang");
    std::fs::write(&source, "publish(\"taniya\");").unwrap();
    let compiler = dir.path().join("compiler");
    std::fs::write(&compiler, "#!/bin/sh\necho taniya\n").unwrap();
    std::fs::set_permissions(&compiler, std::fs::Permissions::from_mode(0o755)).unwrap();

    let out = phaselens(&[
        "compile",
        source.to_str().unwrap(),
        "--compiler",
        compiler.to_str().unwrap(),
    ]);
    assert!(out.status.success(), "{:?}", out);
    assert_eq!(String::from_utf8(out.stdout).unwrap(), "Compiler Output:\ntaniya\n");
}
