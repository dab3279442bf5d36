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

//!
//! Error types for the pipeline core
//!

use std::error;
use std::fmt;
use std::io;

/// An error that occurred somewhere in the pipeline
#[derive(Debug)]
pub enum Error {
    /// A Sample Source read or seek failed
    Io(io::Error),
    /// Construction arguments were inconsistent (mismatched FFT length, `R < 2`, `B < 2`,
    /// `D < 1`, ...)
    InvalidArgument(String),
    /// Allocating an FFT plan or buffer failed
    ResourceExhausted(String),
    /// A worker is no longer running; its frames can no longer be fetched
    Stopped,
    /// A ring still has outstanding consumer references and cannot be destroyed
    Busy,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::InvalidArgument(msg) => write!(f, "invalid argument: {}", msg),
            Error::ResourceExhausted(msg) => write!(f, "resource exhausted: {}", msg),
            Error::Stopped => write!(f, "worker is stopped"),
            Error::Busy => write!(f, "ring has outstanding consumer references"),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

/// Convenient alias for `Result<T, Error>`
pub type Result<T> = std::result::Result<T, Error>;
