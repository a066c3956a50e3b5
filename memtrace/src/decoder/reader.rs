//! Streaming record reader

use log::{debug, warn};
use memtrace_common::{RecordTag, MODULE_NAME_LEN};
use std::io::{self, ErrorKind, Read};
use std::iter::FusedIterator;

use super::record::{DecoderConfig, Record};
use crate::domain::{Address, DecodeError};

/// How a fully consumed stream ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    /// End of data fell exactly between two records
    Clean,
    /// End of data fell inside the record starting at `offset`
    Truncated { offset: u64 },
}

#[derive(Debug)]
enum DecoderState {
    Reading,
    Finished(StreamEnd),
    Failed,
}

/// Why a field could not be read
enum FieldError {
    /// The source ran dry before the field was complete
    Truncated,
    Io(io::Error),
}

/// Lazy decoder over a byte source
///
/// Yields records until the source is exhausted, a record is cut short, or a
/// fatal error occurs. Once it has stopped it keeps returning `Ok(None)`.
pub struct RecordDecoder<R> {
    reader: R,
    config: DecoderConfig,
    /// Bytes consumed so far
    offset: u64,
    /// Records handed out (discarded page records are not counted)
    records: u64,
    state: DecoderState,
}

impl<R: Read> RecordDecoder<R> {
    pub fn new(reader: R, config: DecoderConfig) -> Self {
        Self { reader, config, offset: 0, records: 0, state: DecoderState::Reading }
    }

    /// Number of bytes consumed from the source
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Number of records produced so far
    #[must_use]
    pub fn records_decoded(&self) -> u64 {
        self.records
    }

    /// How the stream ended, `None` while still reading or after a fatal error
    #[must_use]
    pub fn stream_end(&self) -> Option<StreamEnd> {
        match self.state {
            DecoderState::Finished(end) => Some(end),
            DecoderState::Reading | DecoderState::Failed => None,
        }
    }

    /// Decode the next record
    ///
    /// Returns `Ok(None)` once the stream has ended, cleanly or by
    /// truncation; [`RecordDecoder::stream_end`] tells the two apart.
    ///
    /// # Errors
    /// Returns [`DecodeError::UnknownTag`] for an unrecognised tag byte and
    /// [`DecodeError::Io`] if the source fails. Both stop the decoder.
    pub fn next_record(&mut self) -> Result<Option<Record>, DecodeError> {
        if !matches!(self.state, DecoderState::Reading) {
            return Ok(None);
        }

        loop {
            let record_offset = self.offset;

            let tag_byte = match self.read_tag() {
                Ok(Some(byte)) => byte,
                Ok(None) => {
                    debug!("Trace ended cleanly after {} records", self.records);
                    self.state = DecoderState::Finished(StreamEnd::Clean);
                    return Ok(None);
                }
                Err(source) => return Err(self.fail(DecodeError::Io { offset: record_offset, source })),
            };

            let Some(tag) = RecordTag::from_byte(tag_byte) else {
                return Err(self.fail(DecodeError::UnknownTag { tag: tag_byte, offset: record_offset }));
            };

            match self.read_body(tag) {
                Ok(Some(record)) => {
                    self.records += 1;
                    return Ok(Some(record));
                }
                // Page record with page tracing disabled
                Ok(None) => {}
                Err(FieldError::Truncated) => {
                    warn!(
                        "Trace truncated: record at offset {record_offset} is incomplete ({} bytes read)",
                        self.offset - record_offset
                    );
                    self.state = DecoderState::Finished(StreamEnd::Truncated { offset: record_offset });
                    return Ok(None);
                }
                Err(FieldError::Io(source)) => {
                    return Err(self.fail(DecodeError::Io { offset: record_offset, source }));
                }
            }
        }
    }

    fn fail(&mut self, err: DecodeError) -> DecodeError {
        self.state = DecoderState::Failed;
        err
    }

    fn read_body(&mut self, tag: RecordTag) -> Result<Option<Record>, FieldError> {
        match tag {
            RecordTag::Alloc => {
                let (address, size, backtrace) = self.read_allocation()?;
                Ok(Some(Record::Alloc { address, size, backtrace }))
            }
            RecordTag::Free => Ok(Some(Record::Free { address: self.read_address()? })),
            RecordTag::PageAlloc => {
                let (address, size, backtrace) = self.read_allocation()?;
                Ok(self
                    .config
                    .page_records
                    .then_some(Record::PageAlloc { address, size, backtrace }))
            }
            RecordTag::PageFree => {
                let address = self.read_address()?;
                Ok(self.config.page_records.then_some(Record::PageFree { address }))
            }
            RecordTag::ModuleMeta => {
                let mut buf = [0u8; MODULE_NAME_LEN];
                self.fill(&mut buf)?;
                let start = self.read_address()?;
                let end = self.read_address()?;
                Ok(Some(Record::ModuleMeta { name: module_name(&buf), start, end }))
            }
        }
    }

    fn read_allocation(&mut self) -> Result<(Address, u64, Vec<Address>), FieldError> {
        let address = self.read_address()?;
        let size = self.read_word()?;

        let mut backtrace = Vec::new();
        loop {
            let frame = self.read_word()?;
            if frame == 0 {
                break;
            }
            backtrace.push(Address(frame));
        }

        Ok((address, size, backtrace))
    }

    fn read_address(&mut self) -> Result<Address, FieldError> {
        self.read_word().map(Address)
    }

    fn read_word(&mut self) -> Result<u64, FieldError> {
        let mut buf = [0u8; 8];
        let width = self.config.pointer_width.bytes();
        self.fill(&mut buf[..width])?;
        Ok(u64::from_le_bytes(buf))
    }

    /// Read exactly `buf.len()` bytes, counting whatever arrived before a shortfall
    fn fill(&mut self, buf: &mut [u8]) -> Result<(), FieldError> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) => return Err(FieldError::Truncated),
                Ok(n) => {
                    filled += n;
                    self.offset += n as u64;
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(FieldError::Io(e)),
            }
        }
        Ok(())
    }

    fn read_tag(&mut self) -> io::Result<Option<u8>> {
        let mut tag = [0u8; 1];
        match self.fill(&mut tag) {
            Ok(()) => Ok(Some(tag[0])),
            Err(FieldError::Truncated) => Ok(None),
            Err(FieldError::Io(e)) => Err(e),
        }
    }
}

impl<R: Read> Iterator for RecordDecoder<R> {
    type Item = Result<Record, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}

impl<R: Read> FusedIterator for RecordDecoder<R> {}

/// Decode a NUL-padded name buffer, dropping the padding
fn module_name(buf: &[u8]) -> String {
    let len = buf.iter().rposition(|&b| b != 0).map_or(0, |last| last + 1);
    String::from_utf8_lossy(&buf[..len]).into_owned()
}
