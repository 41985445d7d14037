// Fixed-stride record access for the data section

use std::io::{ErrorKind, Read, Seek, SeekFrom};

use crate::core::bytes::{read_be_f64, read_be_u32};
use crate::core::constants::*;
use crate::core::error::Result;
use crate::core::format::DataRecord;

pub fn record_length(channel_count: usize) -> usize {
    RECORD_ID_SIZE + VALUE_SIZE * channel_count
}

pub fn data_start(channel_headers_start: u64, channel_header_length: u64, channel_count: u64) -> u64 {
    channel_headers_start + channel_header_length * channel_count
}

/// Where records live and how many the header claims there are.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordLayout {
    pub channel_count: usize,
    pub data_start: u64,
    pub record_length: usize,
    pub sample_count: u64,
}

impl RecordLayout {
    pub fn new(channel_count: usize, sample_count: u64) -> Self {
        Self {
            channel_count,
            data_start: data_start(
                CHANNEL_HEADERS_START as u64,
                CHANNEL_HEADER_SIZE as u64,
                channel_count as u64,
            ),
            record_length: record_length(channel_count),
            sample_count,
        }
    }

    pub fn offset_of(&self, index: u64) -> u64 {
        self.data_start + index * self.record_length as u64
    }

    /// Clamp an inclusive range to `[0, sample_count - 1]`, `None` if empty.
    pub fn clamp(&self, start: u64, end: u64) -> Option<(u64, u64)> {
        if self.sample_count == 0 {
            return None;
        }
        let end = end.min(self.sample_count - 1);
        if start > end {
            None
        } else {
            Some((start, end))
        }
    }
}

/// Positioned reads of whole records from any seekable source.
pub struct RecordStore<'a, R> {
    source: &'a mut R,
    layout: RecordLayout,
}

impl<'a, R: Read + Seek> RecordStore<'a, R> {
    pub fn new(source: &'a mut R, layout: RecordLayout) -> Self {
        Self { source, layout }
    }

    pub fn layout(&self) -> &RecordLayout {
        &self.layout
    }

    /// Records `start, start+step, ...` up to `end` inclusive.
    ///
    /// Iteration ends at the first record that is cut short by end of file.
    pub fn read_records(&mut self, start: u64, end: u64, step: u64) -> RecordIter<'_, R> {
        let (next, end) = match self.layout.clamp(start, end) {
            Some((s, e)) => (Some(s), e),
            None => (None, 0),
        };
        RecordIter {
            source: &mut *self.source,
            layout: self.layout,
            next,
            end,
            step: step.max(1),
            position: None,
            buf: vec![0u8; self.layout.record_length],
        }
    }

    pub fn read_record(&mut self, index: u64) -> Result<Option<DataRecord>> {
        self.read_records(index, index, 1).next().transpose()
    }
}

/// Fill as much of `buf` as the source has, retrying interrupted reads.
pub(crate) fn read_up_to<R: Read + ?Sized>(source: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match source.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}

pub struct RecordIter<'a, R> {
    source: &'a mut R,
    layout: RecordLayout,
    next: Option<u64>,
    end: u64,
    step: u64,
    position: Option<u64>,
    buf: Vec<u8>,
}

impl<R: Read + Seek> RecordIter<'_, R> {
    fn fill(&mut self) -> Result<bool> {
        let got = read_up_to(&mut *self.source, &mut self.buf)?;
        Ok(got == self.buf.len())
    }

    fn read_at(&mut self, index: u64) -> Result<Option<DataRecord>> {
        let offset = self.layout.offset_of(index);
        if self.position != Some(offset) {
            self.source.seek(SeekFrom::Start(offset))?;
        }
        self.position = None;

        if !self.fill()? {
            return Ok(None);
        }
        self.position = Some(offset + self.buf.len() as u64);

        let record_id = read_be_u32(&self.buf, 0).unwrap_or_default();
        let values = (0..self.layout.channel_count)
            .map(|ch| read_be_f64(&self.buf, RECORD_ID_SIZE + ch * VALUE_SIZE).unwrap_or(f64::NAN))
            .collect();

        Ok(Some(DataRecord {
            index,
            record_id,
            values,
        }))
    }
}

impl<R: Read + Seek> Iterator for RecordIter<'_, R> {
    type Item = Result<DataRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.next?;
        self.next = index
            .checked_add(self.step)
            .filter(|next| *next <= self.end);

        match self.read_at(index) {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.next = None;
                None
            }
            Err(e) => {
                self.next = None;
                Some(Err(e))
            }
        }
    }
}
