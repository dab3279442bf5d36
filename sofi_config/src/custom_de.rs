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
//! Custom deserialization functions
//!

use serde::de::Error;
use serde::{Deserialize, Deserializer};

/// Deserializes a `Vec<T>`, but returns an error if the result would have fewer than two elements
///
/// A receiver count below 2 can't be synchronized or combined (spec.md §6's `R >= 2`).
pub fn deserialize_at_least_two<'de, T, D>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let values = Vec::<T>::deserialize(deserializer)?;
    if values.len() < 2 {
        Err(D::Error::invalid_length(values.len(), &"at least two receiver sources"))
    } else {
        Ok(values)
    }
}
