use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

struct TestDir {
    path: PathBuf,
}

impl TestDir {
    fn new(tag: &str) -> Self {
        let ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_nanos());
        let path = std::env::temp_dir().join(format!(
            "terraplot_cli_{tag}_{}_{}",
            std::process::id(),
            ts
        ));
        fs::create_dir_all(&path).expect("create temp test dir");
        Self { path }
    }
}

impl Drop for TestDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

fn run_terraplot(args: &[&str], cwd: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_terraplot"))
        .args(args)
        .current_dir(cwd)
        .output()
        .expect("run terraplot")
}

#[test]
fn eval_prints_the_result() {
    let dir = TestDir::new("eval");
    let output = run_terraplot(&["-e", "3 + 4 * 2"], &dir.path);

    assert!(output.status.success(), "process failed: {output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.trim(), "11");
}

#[test]
fn eval_geometry_as_geojson() {
    let dir = TestDir::new("geojson");
    let output = run_terraplot(
        &["-e", "wkt('POINT (10 20)')", "--format", "geojson"],
        &dir.path,
    );

    assert!(output.status.success(), "process failed: {output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout.trim(),
        r#"{"type":"Point","coordinates":[10.0,20.0]}"#
    );
}

#[test]
fn script_file_keeps_variables_across_lines() {
    let dir = TestDir::new("script");
    let script = dir.path.join("totals.tp");
    fs::write(
        &script,
        "# running totals\n\
         total = 10\n\
         \n\
         total = total + 5\n\
         'total is ' . total\n",
    )
    .expect("write script");

    let output = run_terraplot(&["totals.tp"], &dir.path);
    assert!(output.status.success(), "process failed: {output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines, ["10", "15", "total is 15"]);
}

#[test]
fn parse_errors_report_file_and_line() {
    let dir = TestDir::new("parse_err");
    let script = dir.path.join("broken.tp");
    fs::write(&script, "1 + 2\n(3 + 4\n").expect("write script");

    let output = run_terraplot(&["broken.tp"], &dir.path);
    assert!(!output.status.success(), "process should fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("broken.tp:2"),
        "expected file:line in stderr, got: {stderr}"
    );
}

#[test]
fn runtime_errors_stop_the_run() {
    let dir = TestDir::new("runtime_err");
    let output = run_terraplot(&["-e", "1 / 0"], &dir.path);
    assert!(!output.status.success(), "process should fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("overflow"),
        "expected overflow message, got: {stderr}"
    );
}

#[test]
fn map_results_print_canonically() {
    let dir = TestDir::new("map");
    let script = dir.path.join("maps.tp");
    fs::write(&script, "a[1] = 5\na\n").expect("write script");

    let output = run_terraplot(&["maps.tp"], &dir.path);
    assert!(output.status.success(), "process failed: {output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines, ["5", "[5]"]);
}
