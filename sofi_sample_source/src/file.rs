/*
 * Copyright 2019 The Regents of the University of California
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 *
 */

//! A [`SampleSource`] over any `std::io::Read` (a file, a named pipe, a device node opened by
//! the caller). The kernel device interface itself (opening `/dev/swradioN`, configuring its
//! sample format) is outside this crate's scope; this type only knows how to read bytes.

use std::io::{self, Read};

use crate::{SampleSource, BYTES_PER_SAMPLE};

/// A `SampleSource` that peeks bytes from an underlying reader into a growable buffer
pub struct FileSampleSource<R> {
    inner: R,
    /// Bytes read from `inner` but not yet committed
    buffer: Vec<u8>,
    /// Number of leading bytes in `buffer` that the last `peek` returned
    peeked_len: usize,
    /// Total bytes committed, for diagnostics
    bytes_committed: u64,
}

impl<R: Read> FileSampleSource<R> {
    /// Wraps a reader as a Sample Source
    pub fn new(inner: R) -> Self {
        FileSampleSource {
            inner,
            buffer: Vec::new(),
            peeked_len: 0,
            bytes_committed: 0,
        }
    }

    /// Total bytes committed so far
    pub fn bytes_committed(&self) -> u64 {
        self.bytes_committed
    }
}

impl<R: Read> SampleSource for FileSampleSource<R> {
    fn peek(&mut self, max_bytes: usize) -> io::Result<&[u8]> {
        if self.peeked_len == 0 {
            self.buffer.clear();
            self.buffer.resize(max_bytes, 0);
            let n = read_some(&mut self.inner, &mut self.buffer)?;
            self.buffer.truncate(n);
            self.peeked_len = n;
        }
        Ok(&self.buffer[..self.peeked_len])
    }

    fn commit(&mut self) -> io::Result<()> {
        self.bytes_committed += self.peeked_len as u64;
        log::trace!(
            "FileSampleSource: committed {} bytes ({} total)",
            self.peeked_len,
            self.bytes_committed
        );
        self.buffer.clear();
        self.peeked_len = 0;
        Ok(())
    }

    fn seek(&mut self, delta_samples: i64) -> io::Result<()> {
        if delta_samples < 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "cannot seek a byte-stream Sample Source backward",
            ));
        }
        let mut remaining = delta_samples as u64 * BYTES_PER_SAMPLE as u64;
        let mut discard = [0u8; 4096];
        while remaining > 0 {
            let chunk = remaining.min(discard.len() as u64) as usize;
            let n = read_some(&mut self.inner, &mut discard[..chunk])?;
            if n == 0 {
                break;
            }
            remaining -= n as u64;
        }
        Ok(())
    }
}

/// Reads at least one byte (if any are available) into `buf`, looping on short reads the way
/// device nodes and pipes commonly produce them
fn read_some<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    if buf.is_empty() {
        return Ok(0);
    }
    reader.read(buf)
}
