//! Decoder, analyzer and reports working together on in-memory traces

use anyhow::Result;
use memtrace::analysis::{common_callers, Analysis, Analyzer, RunState, SortOrder};
use memtrace::decoder::{DecoderConfig, RecordDecoder, TraceWriter};
use memtrace::domain::Address;
use memtrace::report::{BacktraceRenderer, Reporter};
use memtrace::symbolization::{ArtifactMap, Symbolicate};
use memtrace_common::PointerWidth;
use std::path::Path;

struct NamingSymbolicator;

impl Symbolicate for NamingSymbolicator {
    fn symbolicate(&self, artifact: &Path, offset: u64) -> Result<String> {
        let name = artifact.file_name().and_then(|n| n.to_str()).unwrap_or("?");
        Ok(format!("{name}@{offset:#x}"))
    }
}

fn analyze(build: impl FnOnce(&mut TraceWriter<Vec<u8>>)) -> Analysis {
    let mut writer = TraceWriter::new(Vec::new(), PointerWidth::Wide);
    build(&mut writer);
    let bytes = writer.finish().unwrap();
    Analyzer::new(4096).consume(RecordDecoder::new(bytes.as_slice(), DecoderConfig::default()))
}

#[test]
fn test_size_ranking_keeps_insertion_order_on_ties() {
    // Sizes 1..=12 with counts 1,1,1,2,2,2,3,3,3,4,4,4
    let analysis = analyze(|w| {
        let mut address = 0x1000;
        for size in 1..=12u64 {
            for _ in 0..(size - 1) / 3 + 1 {
                w.alloc(Address(address), size, &[Address(0x40)]).unwrap();
                address += 0x100;
            }
        }
    });
    let stats = analysis.stats();

    let top: Vec<u64> = stats.most_frequent(10).into_iter().map(|(size, _)| size).collect();
    let bottom: Vec<u64> = stats.least_frequent(10).into_iter().map(|(size, _)| size).collect();

    assert_eq!(top, (3..=12).collect::<Vec<_>>());
    assert_eq!(bottom, (1..=10).collect::<Vec<_>>());
}

#[test]
fn test_reports_symbolicate_module_relative_offsets() {
    let build = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(build.path().join("modules")).unwrap();
    std::fs::write(build.path().join("modules/usb.ko"), b"").unwrap();

    let analysis = analyze(|w| {
        w.module("usb", Address(0x9000), Address(0xa000)).unwrap();
        w.alloc(Address(0x10), 24, &[Address(0x9010), Address(0x55)]).unwrap();
    });
    assert_eq!(analysis.state(), RunState::Reporting);

    let artifacts = ArtifactMap::new(build.path());
    let symbolicator = NamingSymbolicator;
    let renderer = BacktraceRenderer::new(analysis.modules(), &artifacts, &symbolicator);
    let reporter = Reporter::new(&analysis, Some(renderer));

    let mut out = Vec::new();
    reporter.write_unfreed(&mut out).unwrap();
    let text = String::from_utf8(out).unwrap();

    assert_eq!(
        text,
        "Unfreed Blocks\n\
         Unfreed 10 of size 24:\n\
         \tusb.ko@0x10\n\
         \t55 (unknown module \"kernel\")\n\
         \n\
         Total 24 bytes left unfreed.\n"
    );
}

#[test]
fn test_callers_group_by_call_site() {
    let analysis = analyze(|w| {
        for i in 0..3u64 {
            w.alloc(Address(0x1000 + i * 0x10), 8, &[Address(0x1), Address(0xaa)]).unwrap();
        }
        w.alloc(Address(0x5000), 100, &[Address(0x1), Address(0xbb)]).unwrap();
        w.free(Address(0x1000)).unwrap();
    });

    let groups = common_callers(analysis.ledger(), SortOrder::Descending, 10);
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0].caller, Address(0xaa));
    assert_eq!(groups[0].count, 2);
    assert_eq!(groups[0].total_bytes, 16);
    assert_eq!(groups[1].caller, Address(0xbb));

    let reversed = common_callers(analysis.ledger(), SortOrder::Ascending, 1);
    assert_eq!(reversed.len(), 1);
    assert_eq!(reversed[0].caller, Address(0xbb));
}
