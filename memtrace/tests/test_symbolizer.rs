use memtrace::symbolization::{Addr2lineCommand, DwarfSymbolicator, Symbolicate, Symbolizer};
use std::path::Path;

#[test]
fn test_symbolizer_creation() {
    // Test that we can create a symbolizer for a binary
    let binary_path = env!("CARGO_BIN_EXE_memtrace");

    println!("Testing symbolizer creation on: {}", binary_path);

    let symbolizer = Symbolizer::new(binary_path);
    assert!(symbolizer.is_ok(), "Failed to create symbolizer: {:?}", symbolizer.err());
}

#[test]
fn test_symbolicator_resolves_function_names() {
    let binary_path = env!("CARGO_BIN_EXE_memtrace");
    let symbolicator = DwarfSymbolicator::new();

    // Get function addresses from nm
    let Ok(nm_output) = std::process::Command::new("nm").args(["-C", binary_path]).output() else {
        println!("nm not available, skipping");
        return;
    };
    let symbols = String::from_utf8_lossy(&nm_output.stdout);

    let mut attempts = 0;
    let mut found_valid_symbol = false;

    for line in symbols.lines().filter(|line| line.contains(" T ")).take(5) {
        let Some(addr) = line.split_whitespace().next().and_then(|s| u64::from_str_radix(s, 16).ok())
        else {
            continue;
        };
        attempts += 1;

        let described = symbolicator
            .symbolicate(Path::new(binary_path), addr)
            .expect("binary should carry debug info");
        println!("0x{addr:x} ({line}) -> {described}");

        if !described.starts_with("??") {
            found_valid_symbol = true;
        }
    }

    if attempts > 0 {
        assert!(found_valid_symbol, "none of {attempts} text symbols resolved to a function");
    }
}

#[test]
fn test_symbolicator_rejects_non_object_file() {
    let dir = tempfile::tempdir().unwrap();
    let artifact = dir.path().join("vfs.ko");
    std::fs::write(&artifact, b"definitely not ELF").unwrap();

    let symbolicator = DwarfSymbolicator::new();
    assert!(symbolicator.symbolicate(&artifact, 0x10).is_err());
}

#[test]
fn test_addr2line_command_missing_program() {
    let command = Addr2lineCommand::new("/nonexistent/bin/addr2line");
    let result = command.symbolicate(Path::new(env!("CARGO_BIN_EXE_memtrace")), 0x1000);
    assert!(result.is_err());
}
