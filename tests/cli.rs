//! End-to-end runs of the clawsweep binary

#![cfg(unix)]

use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::process::{Child, Command, Output, Stdio};
use std::time::{Duration, Instant};
use tempfile::TempDir;

fn clawsweep(dir: &Path, args: &[&str], stdin: &str) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_clawsweep"))
        .args(args)
        .current_dir(dir)
        .env_remove("CLAW_NPROCS")
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child.stdin.take().unwrap().write_all(stdin.as_bytes()).unwrap();
    child.wait_with_output().unwrap()
}

/// Start clawsweep with stdin left open, so it blocks at its first prompt
fn clawsweep_waiting(dir: &Path, args: &[&str]) -> Child {
    Command::new(env!("CARGO_BIN_EXE_clawsweep"))
        .args(args)
        .current_dir(dir)
        .env_remove("CLAW_NPROCS")
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .unwrap()
}

fn interrupt(child: &Child) {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;
    kill(Pid::from_raw(child.id() as i32), Signal::SIGINT).unwrap();
}

fn exits_within(child: &mut Child, limit: Duration) -> Option<std::process::ExitStatus> {
    let deadline = Instant::now() + limit;
    while Instant::now() < deadline {
        if let Some(status) = child.try_wait().unwrap() {
            return Some(status);
        }
        std::thread::sleep(Duration::from_millis(50));
    }
    let _ = child.kill();
    let _ = child.wait();
    None
}

fn case_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|n| n.starts_with("case"))
        .collect();
    names.sort();
    names
}

#[test]
fn test_sample_sweep_on_two_processes() {
    let temp = TempDir::new().unwrap();
    let output = clawsweep(temp.path(), &["-q", "sample", "2", "--yes", "--delay-ms", "0"], "");

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("7 cases will be run on 2 processes"));
    assert!(stdout.contains("Done..."));

    let expected: Vec<String> = (0..7).map(|n| format!("case{}.out", n)).collect();
    assert_eq!(case_files(temp.path()), expected);
    for n in 0..7 {
        let text = std::fs::read_to_string(temp.path().join(format!("case{}.out", n))).unwrap();
        assert!(text.ends_with(&format!("Done with case {}\n", n)));
    }
}

#[test]
fn test_confirmation_prompt_answered_yes() {
    let temp = TempDir::new().unwrap();
    let output = clawsweep(temp.path(), &["-q", "sample", "3", "--count", "3", "--delay-ms", "0"], "Yes\n");

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("OK to run?"));
    assert_eq!(case_files(temp.path()).len(), 3);
}

#[test]
fn test_declined_run_creates_nothing() {
    let temp = TempDir::new().unwrap();
    let output = clawsweep(temp.path(), &["sample", "2", "--delay-ms", "0"], "n\n");

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Aborting"));
    assert!(case_files(temp.path()).is_empty());
}

#[test]
fn test_nprocs_from_environment() {
    let temp = TempDir::new().unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_clawsweep"))
        .args(["-q", "sample", "--yes", "--count", "2", "--delay-ms", "0"])
        .current_dir(temp.path())
        .env("CLAW_NPROCS", "3")
        .output()
        .unwrap();

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("2 cases will be run on 3 processes"));
}

#[test]
fn test_zero_processes_rejected() {
    let temp = TempDir::new().unwrap();
    let output = clawsweep(temp.path(), &["sample", "0", "--yes"], "");

    assert!(!output.status.success());
    assert!(case_files(temp.path()).is_empty());
}

#[test]
fn test_beta_sweep_with_fake_solver() {
    let temp = TempDir::new().unwrap();
    let solver = temp.path().join("xclaw");
    std::fs::write(&solver, "#!/bin/sh\necho solved > solver.txt\n").unwrap();
    std::fs::set_permissions(&solver, std::fs::Permissions::from_mode(0o755)).unwrap();
    std::fs::write(
        temp.path().join("setrun.json"),
        r#"{"claw": {"num_dim": 1, "num_cells": [50]}, "probdata": {"u": 1.0, "beta": 200.0}}"#,
    )
    .unwrap();

    let output = clawsweep(
        temp.path(),
        &[
            "-q", "beta", "2", "--yes", "--values", "20,1000", "--xclaw", "./xclaw",
            "--no-plots", "--no-nohup", "--skip-build",
        ],
        "",
    );

    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    for beta in ["20", "1000"] {
        let outdir = temp.path().join(format!("_output_beta{}", beta));
        assert!(outdir.join("solver.txt").exists());
        let setprob = std::fs::read_to_string(outdir.join("setprob.data")).unwrap();
        assert!(setprob.contains(&format!("{}.0", beta)));
        assert!(outdir.join("claw.data").exists());
        assert!(temp.path().join(format!("run_beta{}.output", beta)).exists());
        assert!(!temp.path().join(format!("_plots_beta{}", beta)).exists());
    }
}

#[test]
fn test_failing_solver_fails_the_run() {
    let temp = TempDir::new().unwrap();
    let solver = temp.path().join("xclaw");
    std::fs::write(&solver, "#!/bin/sh\nexit 2\n").unwrap();
    std::fs::set_permissions(&solver, std::fs::Permissions::from_mode(0o755)).unwrap();
    std::fs::write(temp.path().join("setrun.json"), r#"{"claw": {"num_cells": [50]}}"#).unwrap();

    let output = clawsweep(
        temp.path(),
        &[
            "-q", "mx", "2", "--yes", "--values", "100,200", "--xclaw", "./xclaw",
            "--no-plots", "--no-nohup", "--skip-build",
        ],
        "",
    );

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("2 of 2 workers failed"));
    let data = std::fs::read_to_string(temp.path().join("_output_mx200/claw.data")).unwrap();
    assert!(data.contains("200"));
}

#[test]
fn test_interrupt_at_run_prompt_exits() {
    let temp = TempDir::new().unwrap();
    let mut child = clawsweep_waiting(temp.path(), &["sample", "1", "--delay-ms", "0"]);
    std::thread::sleep(Duration::from_millis(800));

    interrupt(&child);
    let status = exits_within(&mut child, Duration::from_secs(5)).expect("still waiting at the prompt");

    assert!(!status.success());
    assert!(case_files(temp.path()).is_empty());
}

#[test]
fn test_interrupt_at_overwrite_prompt_keeps_directory() {
    let temp = TempDir::new().unwrap();
    let outdir = temp.path().join("_output_beta20");
    std::fs::create_dir(&outdir).unwrap();
    std::fs::write(outdir.join("fort.q0000"), "frame").unwrap();

    let mut child = clawsweep_waiting(
        temp.path(),
        &["beta", "1", "--values", "20", "--no-plots", "--skip-build"],
    );
    // Confirm the run, then leave the overwrite question unanswered.
    child.stdin.as_mut().unwrap().write_all(b"y\n").unwrap();
    std::thread::sleep(Duration::from_millis(800));

    interrupt(&child);
    let status = exits_within(&mut child, Duration::from_secs(5)).expect("still waiting at the prompt");

    assert!(!status.success());
    assert!(outdir.join("fort.q0000").exists());
}
