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

//! Debug sink writing native-endian binary floats to anything that implements `std::io::Write`

use std::error::Error;
use std::io::Write;

use byteorder::{NativeEndian, WriteBytesExt};

use super::{fftshift, DebugSink};

/// Writes fftshifted `f32` spectra to a `std::io::Write` sink (a file, stdout, or a pipe)
///
/// Mirrors the teacher's `output/stdio::StdioOutput`: several small `write` calls per frame, so
/// wrapping the sink in a `BufWriter` is recommended for file/pipe destinations.
pub struct StdioDebugSink<W> {
    inner: W,
    scratch: Vec<f32>,
}

impl<W> StdioDebugSink<W> {
    /// Wraps a writer as a debug sink
    pub fn new(inner: W) -> Self {
        StdioDebugSink {
            inner,
            scratch: Vec::new(),
        }
    }
}

impl<W> DebugSink for StdioDebugSink<W>
where
    W: Write,
{
    fn write_phase(&mut self, phase: &[f32]) -> Result<(), Box<dyn Error + Send>> {
        write_shifted(&mut self.inner, phase, &mut self.scratch)
    }

    fn write_magnitude(&mut self, mag: &[f32]) -> Result<(), Box<dyn Error + Send>> {
        write_shifted(&mut self.inner, mag, &mut self.scratch)
    }

    fn flush(&mut self) -> Result<(), Box<dyn Error + Send>> {
        self.inner.flush().map_err(box_err)
    }
}

fn write_shifted<W: Write>(
    writer: &mut W,
    values: &[f32],
    scratch: &mut Vec<f32>,
) -> Result<(), Box<dyn Error + Send>> {
    fftshift(values, scratch);
    for &value in scratch.iter() {
        writer.write_f32::<NativeEndian>(value).map_err(box_err)?;
    }
    Ok(())
}

fn box_err(e: std::io::Error) -> Box<dyn Error + Send> {
    Box::new(e)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_frame_order_is_phases_then_magnitude() {
        let mut buf = Vec::new();
        {
            let mut sink = StdioDebugSink::new(&mut buf);
            super::super::write_frame(
                &mut sink,
                &[1.0, 2.0, 3.0, 4.0],
                &[vec![0.1, 0.2, 0.3, 0.4]],
            )
            .unwrap();
        }
        // One phase vector (4 floats) then the magnitude (4 floats) = 8 floats = 32 bytes.
        assert_eq!(buf.len(), 8 * 4);
    }
}
