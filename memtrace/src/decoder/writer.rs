//! Trace encoder
//!
//! Writes records in exactly the layout [`RecordDecoder`](super::RecordDecoder)
//! reads. Used to build fixtures; the analyzer itself never writes traces.

use memtrace_common::{PointerWidth, RecordTag, MODULE_NAME_LEN};
use std::io::{self, Write};

use crate::domain::Address;

/// Encoder for the allocation-trace format
pub struct TraceWriter<W> {
    writer: W,
    pointer_width: PointerWidth,
}

impl<W: Write> TraceWriter<W> {
    pub fn new(writer: W, pointer_width: PointerWidth) -> Self {
        Self { writer, pointer_width }
    }

    /// Write a heap allocation record
    ///
    /// # Errors
    /// Returns `InvalidInput` if a value does not fit the pointer width or a
    /// backtrace entry is zero (which would terminate the backtrace early)
    pub fn alloc(&mut self, address: Address, size: u64, backtrace: &[Address]) -> io::Result<()> {
        self.allocation(RecordTag::Alloc, address, size, backtrace)
    }

    /// Write a heap free record
    ///
    /// # Errors
    /// Returns `InvalidInput` if the address does not fit the pointer width
    pub fn free(&mut self, address: Address) -> io::Result<()> {
        self.release(RecordTag::Free, address)
    }

    /// Write a page allocation record
    ///
    /// # Errors
    /// Same conditions as [`TraceWriter::alloc`]
    pub fn page_alloc(
        &mut self,
        address: Address,
        size: u64,
        backtrace: &[Address],
    ) -> io::Result<()> {
        self.allocation(RecordTag::PageAlloc, address, size, backtrace)
    }

    /// Write a page free record
    ///
    /// # Errors
    /// Returns `InvalidInput` if the address does not fit the pointer width
    pub fn page_free(&mut self, address: Address) -> io::Result<()> {
        self.release(RecordTag::PageFree, address)
    }

    /// Write a module metadata record
    ///
    /// # Errors
    /// Returns `InvalidInput` if the name is longer than the name buffer or an
    /// address does not fit the pointer width
    pub fn module(&mut self, name: &str, start: Address, end: Address) -> io::Result<()> {
        if name.len() > MODULE_NAME_LEN {
            return Err(invalid_input(format!(
                "module name {name:?} is longer than {MODULE_NAME_LEN} bytes"
            )));
        }

        let mut buf = [0u8; MODULE_NAME_LEN];
        buf[..name.len()].copy_from_slice(name.as_bytes());

        self.writer.write_all(&[RecordTag::ModuleMeta.as_byte()])?;
        self.writer.write_all(&buf)?;
        self.word(start.get())?;
        self.word(end.get())
    }

    /// Write raw bytes, e.g. to append a deliberately broken tail
    ///
    /// # Errors
    /// Propagates write failures from the underlying writer
    pub fn raw(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.writer.write_all(bytes)
    }

    /// Flush and hand back the underlying writer
    ///
    /// # Errors
    /// Propagates flush failures from the underlying writer
    pub fn finish(mut self) -> io::Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }

    fn allocation(
        &mut self,
        tag: RecordTag,
        address: Address,
        size: u64,
        backtrace: &[Address],
    ) -> io::Result<()> {
        if backtrace.iter().any(|frame| frame.get() == 0) {
            return Err(invalid_input("backtrace entries must be non-zero".to_string()));
        }

        self.writer.write_all(&[tag.as_byte()])?;
        self.word(address.get())?;
        self.word(size)?;
        for frame in backtrace {
            self.word(frame.get())?;
        }
        self.word(0)
    }

    fn release(&mut self, tag: RecordTag, address: Address) -> io::Result<()> {
        self.writer.write_all(&[tag.as_byte()])?;
        self.word(address.get())
    }

    fn word(&mut self, value: u64) -> io::Result<()> {
        let width = self.pointer_width.bytes();
        let bytes = value.to_le_bytes();
        if bytes[width..].iter().any(|&b| b != 0) {
            return Err(invalid_input(format!(
                "value {value:#x} does not fit in {width}-byte pointer fields"
            )));
        }
        self.writer.write_all(&bytes[..width])
    }
}

fn invalid_input(msg: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, msg)
}
