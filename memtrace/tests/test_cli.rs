//! End-to-end runs of the memtrace binary

use memtrace::decoder::TraceWriter;
use memtrace::domain::Address;
use memtrace_common::PointerWidth;
use std::path::Path;
use std::process::{Command, Output};

fn memtrace(trace: &Path, build_dir: &Path, extra: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_memtrace"))
        .arg(trace)
        .arg("--build-dir")
        .arg(build_dir)
        .args(extra)
        .output()
        .expect("Failed to run memtrace")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_unfreed_report() {
    let dir = tempfile::tempdir().unwrap();
    let trace = dir.path().join("memtrace.bin");

    let mut w = TraceWriter::new(Vec::new(), PointerWidth::Wide);
    w.alloc(Address(0x1000), 64, &[Address(0x77)]).unwrap();
    w.alloc(Address(0x2000), 32, &[Address(0x78)]).unwrap();
    w.free(Address(0x2000)).unwrap();
    std::fs::write(&trace, w.finish().unwrap()).unwrap();

    let output = memtrace(&trace, dir.path(), &["unfreed"]);
    let text = stdout(&output);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(text.starts_with("Loaded 2 allocations and 1 frees, and 0 metadata items\n"));
    assert!(text.contains("Unfreed Blocks\nUnfreed 1000 of size 64:\n"));
    assert!(text.contains("\t77 (unknown module \"kernel\")\n"));
    assert!(text.contains("Total 64 bytes left unfreed.\n"));
    assert!(!text.contains("Unfreed 2000"));
}

#[test]
fn test_truncated_trace_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let trace = dir.path().join("memtrace.bin");

    let mut w = TraceWriter::new(Vec::new(), PointerWidth::Wide);
    w.alloc(Address(0x1000), 64, &[Address(0x77)]).unwrap();
    w.raw(&[b'A', 0x00, 0x20]).unwrap();
    std::fs::write(&trace, w.finish().unwrap()).unwrap();

    let output = memtrace(&trace, dir.path(), &["unfreed", "nobacktrace"]);

    assert!(output.status.success());
    assert_eq!(
        stdout(&output),
        "Loaded 1 allocations and 0 frees, and 0 metadata items\n\
         Unfreed Blocks\n\
         Unfreed 1000 of size 64:\n\
         Total 64 bytes left unfreed.\n"
    );
    assert!(stderr(&output).contains("truncated"));
}

#[test]
fn test_unfreed_total_beyond_u64() {
    let dir = tempfile::tempdir().unwrap();
    let trace = dir.path().join("memtrace.bin");

    let mut w = TraceWriter::new(Vec::new(), PointerWidth::Wide);
    w.alloc(Address(0x1000), 1 << 63, &[Address(0x77)]).unwrap();
    w.alloc(Address(0x2000), 1 << 63, &[Address(0x78)]).unwrap();
    std::fs::write(&trace, w.finish().unwrap()).unwrap();

    let output = memtrace(&trace, dir.path(), &["unfreed", "callers", "nobacktrace"]);
    let text = stdout(&output);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(text.contains("Total 18446744073709551616 bytes left unfreed.\n"));
    assert!(text.contains("With 1 entries, a total of 9223372036854775808 bytes:\n"));
}

#[test]
fn test_unknown_tag_fails_after_reporting() {
    let dir = tempfile::tempdir().unwrap();
    let trace = dir.path().join("memtrace.bin");

    let mut w = TraceWriter::new(Vec::new(), PointerWidth::Wide);
    w.alloc(Address(0x1000), 64, &[]).unwrap();
    w.raw(b"Z").unwrap();
    std::fs::write(&trace, w.finish().unwrap()).unwrap();

    let output = memtrace(&trace, dir.path(), &["unfreed"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("Loaded 1 allocations and 0 frees"));
    assert!(stderr(&output).contains("Invalid record tag 0x5a"));
}

#[test]
fn test_narrow_pointer_width_and_modes() {
    let dir = tempfile::tempdir().unwrap();
    let trace = dir.path().join("memtrace.bin");

    let mut w = TraceWriter::new(Vec::new(), PointerWidth::Narrow);
    w.alloc(Address(0x100), 8192, &[Address(0x8f01_2345)]).unwrap();
    w.alloc(Address(0x200), 16, &[Address(0x10)]).unwrap();
    w.free(Address(0x100)).unwrap();
    std::fs::write(&trace, w.finish().unwrap()).unwrap();

    let output = memtrace(
        &trace,
        dir.path(),
        &["--pointer-width", "4", "toobig", "counts", "nobacktrace"],
    );
    let text = stdout(&output);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(text.contains("Too Big Blocks\nBlock 100 should perhaps not be on the heap"));
    assert!(text.contains("Size Distribution\n"));
    assert!(text.contains("Top 10 sizes by count\n"));
    assert!(!text.contains("Unfreed Blocks"));
}

#[test]
fn test_missing_trace_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let output = memtrace(&dir.path().join("absent.bin"), dir.path(), &[]);

    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("Trace not found"));
}

#[test]
fn test_export_flag_writes_json() {
    let dir = tempfile::tempdir().unwrap();
    let trace = dir.path().join("memtrace.bin");
    let export = dir.path().join("out.json");

    let mut w = TraceWriter::new(Vec::new(), PointerWidth::Wide);
    w.alloc(Address(0x1000), 64, &[]).unwrap();
    std::fs::write(&trace, w.finish().unwrap()).unwrap();

    let output = memtrace(&trace, dir.path(), &["--quiet", "--export", export.to_str().unwrap()]);
    assert!(output.status.success());

    let parsed: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&export).unwrap()).unwrap();
    assert_eq!(parsed["unfreed_bytes"], 64);
}
