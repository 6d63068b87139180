// Command-line behavior of the `nwc` binary: emit stages, output files,
// stdin input, and exit codes.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

fn nwc_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_nwc"))
}

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

fn run_nwc(args: &[&str]) -> Output {
    Command::new(nwc_binary())
        .args(args)
        .output()
        .expect("failed to run nwc")
}

fn stdout(out: &Output) -> String {
    String::from_utf8(out.stdout.clone()).expect("non-UTF8 output")
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

#[test]
fn emits_hdl_by_default() {
    let path = fixture("basic.json");
    let out = run_nwc(&[path.to_str().unwrap()]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert!(stdout(&out).contains("    self.connect(self.A.out, self.B.in)\n"));
}

#[test]
fn module_naming_flags() {
    let path = fixture("basic.json");
    let out = run_nwc(&[
        path.to_str().unwrap(),
        "--module-name",
        "Blinky",
        "--module-base",
        "JlcBoardTop",
    ]);
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert!(stdout(&out).starts_with("class Blinky(JlcBoardTop):\n"));
}

#[test]
fn lowering_error_exits_1() {
    let path = fixture("bad_port_name.json");
    let out = run_nwc(&[path.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(1));
    assert!(stdout(&out).is_empty());
    assert!(
        stderr(&out).contains("error[E0102]: A.out-1: invalid port name"),
        "stderr: {}",
        stderr(&out)
    );
}

#[test]
fn missing_source_exits_2() {
    let out = run_nwc(&["/nonexistent/netlist.json"]);
    assert_eq!(out.status.code(), Some(2));
    assert!(stderr(&out).contains("/nonexistent/netlist.json"));
}

#[test]
fn bad_library_exits_2() {
    let dir = std::env::temp_dir().join(format!("nwc-cli-lib-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let lib = dir.join("library.json");
    std::fs::write(&lib, r#"{ "adapt_rules": [{ "accepts": [], "exposes": "Ground" }] }"#).unwrap();

    let path = fixture("basic.json");
    let out = run_nwc(&[path.to_str().unwrap(), "--library", lib.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(2));
    assert!(stderr(&out).contains("accepts no types"), "stderr: {}", stderr(&out));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn result_document_on_success_and_failure() {
    let ok = run_nwc(&[fixture("basic.json").to_str().unwrap(), "--emit", "result"]);
    assert!(ok.status.success());
    let v: serde_json::Value = serde_json::from_str(&stdout(&ok)).unwrap();
    assert_eq!(v["errors"], serde_json::json!([]));
    assert!(v["edgHdl"].as_str().unwrap().contains("self.Block(Src())"));

    let failed = run_nwc(&[fixture("mixed_shape.json").to_str().unwrap(), "--emit", "result"]);
    assert_eq!(failed.status.code(), Some(1));
    let v: serde_json::Value = serde_json::from_str(&stdout(&failed)).unwrap();
    assert_eq!(v["edgHdl"], "");
    assert_eq!(v["errors"][0]["path"], serde_json::json!(["sig"]));
    assert_eq!(v["errors"][0]["kind"], "invalid input");
}

#[test]
fn graph_and_connections_views() {
    let path = fixture("connector_led.json");
    let graph = run_nwc(&[path.to_str().unwrap(), "--emit", "graph"]);
    assert!(graph.status.success());
    assert!(stdout(&graph).starts_with("Graph (2 nodes, 4 labels)\n"));

    let conns = run_nwc(&[path.to_str().unwrap(), "--emit", "connections"]);
    assert!(conns.status.success());
    assert_eq!(
        stdout(&conns),
        "signal [scalar]: IndicatorLed.signal, PinHeader254Vertical.port_0\n\
         gnd [scalar]: IndicatorLed.gnd, PinHeader254Vertical.port_1\n"
    );
}

#[test]
fn reads_stdin_and_writes_output_file() {
    let dir = std::env::temp_dir().join(format!("nwc-cli-out-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let out_path = dir.join("design.py");

    let mut child = Command::new(nwc_binary())
        .args(["-", "-o", out_path.to_str().unwrap()])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn nwc");
    let source = std::fs::read(fixture("basic.json")).unwrap();
    child.stdin.take().unwrap().write_all(&source).unwrap();
    let out = child.wait_with_output().unwrap();
    assert!(out.status.success(), "stderr: {}", stderr(&out));
    assert!(out.stdout.is_empty());

    let written = std::fs::read_to_string(&out_path).unwrap();
    assert!(written.starts_with("class MyModule(SimpleBoardTop):\n"));

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn verbose_logs_passes_to_stderr() {
    let path = fixture("basic.json");
    let out = run_nwc(&[path.to_str().unwrap(), "--verbose"]);
    assert!(out.status.success());
    let err = stderr(&out);
    assert!(err.contains("pass complete"), "stderr: {}", err);
    assert!(err.contains("emit"), "stderr: {}", err);
}
