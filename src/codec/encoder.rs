// Copyright 2026 BadCompany
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Canonical PageState encoding.
//!
//! Binary, big-endian, every variable field length-prefixed:
//!
//! ```text
//! "FS" | version u8 | page_id [16] | sequence u64 | created_at_ms i64 | confidential u8
//! entry_count u32
//!   target str | name str | editable u8 | multiple u8 | value_count u32
//!     value_id [8] | value str
//! str = len u32 | UTF-8 bytes
//! ```
//!
//! Exactly one byte sequence encodes a given PageState, and `decode` accepts
//! only that sequence, so re-encoding is deterministic and any edit to the
//! bytes either fails to decode or decodes to a different state.

use bytes::{Buf, BufMut, BytesMut};
use std::collections::HashSet;

use crate::engine_core::constants::encoding;
use crate::engine_core::errors::StateError;
use crate::engine_core::models::{PageId, PageState, ParameterRecord, RecordedValue, ValueId};

pub struct StateEncoder;

impl StateEncoder {
    pub fn encode(state: &PageState) -> Vec<u8> {
        let mut dst = BytesMut::with_capacity(Self::encoded_len_hint(state));
        dst.put_slice(encoding::MAGIC);
        dst.put_u8(encoding::FORMAT_VERSION);
        dst.put_slice(state.page_id.as_bytes());
        dst.put_u64(state.sequence);
        dst.put_i64(state.created_at_ms);
        dst.put_u8(u8::from(state.confidential));
        dst.put_u32(state.entries.len() as u32);

        for record in &state.entries {
            put_str(&mut dst, &record.target);
            put_str(&mut dst, &record.name);
            dst.put_u8(u8::from(record.editable));
            dst.put_u8(u8::from(record.multiple));
            dst.put_u32(record.values.len() as u32);
            for value in &record.values {
                dst.put_slice(value.id.as_bytes());
                put_str(&mut dst, &value.value);
            }
        }
        dst.to_vec()
    }

    /// Digest-relevant projection: page id plus target, name, flags and value
    /// ids of every record. Value text is left out.
    pub fn encode_structure(state: &PageState) -> Vec<u8> {
        let mut dst = BytesMut::new();
        dst.put_slice(encoding::MAGIC);
        dst.put_u8(encoding::FORMAT_VERSION);
        dst.put_slice(state.page_id.as_bytes());
        dst.put_u8(u8::from(state.confidential));
        dst.put_u32(state.entries.len() as u32);
        for record in &state.entries {
            put_str(&mut dst, &record.target);
            put_str(&mut dst, &record.name);
            dst.put_u8(u8::from(record.editable));
            dst.put_u8(u8::from(record.multiple));
            dst.put_u32(record.values.len() as u32);
            for value in &record.values {
                dst.put_slice(value.id.as_bytes());
            }
        }
        dst.to_vec()
    }

    pub fn decode(bytes: &[u8]) -> Result<PageState, StateError> {
        let mut src = Reader { buf: bytes };

        if src.take(encoding::MAGIC.len())? != encoding::MAGIC {
            return Err(malformed("bad magic"));
        }
        let version = src.u8()?;
        if version != encoding::FORMAT_VERSION {
            return Err(malformed(format!("unsupported format version {}", version)));
        }

        let mut page_id = [0u8; encoding::PAGE_ID_LENGTH];
        page_id.copy_from_slice(src.take(encoding::PAGE_ID_LENGTH)?);
        let sequence = src.u64()?;
        let created_at_ms = src.i64()?;
        let confidential = src.flag()?;

        let mut state = PageState::new(
            PageId::from_bytes(page_id),
            sequence,
            created_at_ms,
            confidential,
        );

        let entry_count = src.u32()? as usize;
        let mut seen_records: HashSet<(String, String)> = HashSet::new();
        let mut seen_ids: HashSet<ValueId> = HashSet::new();

        for _ in 0..entry_count {
            let target = src.string()?;
            let name = src.string()?;
            if !seen_records.insert((target.clone(), name.clone())) {
                return Err(malformed(format!("duplicate record {}:{}", target, name)));
            }
            let mut record = ParameterRecord::new(target, name, src.flag()?);
            record.multiple = src.flag()?;

            let value_count = src.u32()? as usize;
            if value_count == 0 {
                return Err(malformed("record without values"));
            }
            for _ in 0..value_count {
                let mut id = [0u8; encoding::VALUE_ID_LENGTH];
                id.copy_from_slice(src.take(encoding::VALUE_ID_LENGTH)?);
                let id = ValueId::from_bytes(id);
                if !seen_ids.insert(id) {
                    return Err(malformed("duplicate value id"));
                }
                let value = src.string()?;
                if record.contains_value(&value) {
                    return Err(malformed("duplicate value in record"));
                }
                record.values.push(RecordedValue { id, value });
            }
            state.entries.push(record);
        }

        if src.buf.has_remaining() {
            return Err(malformed("trailing bytes"));
        }
        Ok(state)
    }

    fn encoded_len_hint(state: &PageState) -> usize {
        let fixed = encoding::MAGIC.len() + 1 + encoding::PAGE_ID_LENGTH + 8 + 8 + 1 + 4;
        let records: usize = state
            .entries
            .iter()
            .map(|r| {
                4 + r.target.len()
                    + 4
                    + r.name.len()
                    + 2
                    + 4
                    + r.values
                        .iter()
                        .map(|v| encoding::VALUE_ID_LENGTH + 4 + v.value.len())
                        .sum::<usize>()
            })
            .sum();
        fixed + records
    }
}

fn put_str(dst: &mut BytesMut, s: &str) {
    dst.put_u32(s.len() as u32);
    dst.put_slice(s.as_bytes());
}

fn malformed(reason: impl Into<String>) -> StateError {
    StateError::MalformedState(reason.into())
}

/// Bounds-checked cursor; `Buf` getters panic on short input.
struct Reader<'a> {
    buf: &'a [u8],
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], StateError> {
        if self.buf.remaining() < n {
            return Err(malformed("truncated input"));
        }
        let (head, tail) = self.buf.split_at(n);
        self.buf = tail;
        Ok(head)
    }

    fn u8(&mut self) -> Result<u8, StateError> {
        Ok(self.take(1)?.get_u8())
    }

    fn u32(&mut self) -> Result<u32, StateError> {
        Ok(self.take(4)?.get_u32())
    }

    fn u64(&mut self) -> Result<u64, StateError> {
        Ok(self.take(8)?.get_u64())
    }

    fn i64(&mut self) -> Result<i64, StateError> {
        Ok(self.take(8)?.get_i64())
    }

    fn flag(&mut self) -> Result<bool, StateError> {
        match self.u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(malformed(format!("invalid flag byte {}", other))),
        }
    }

    fn string(&mut self) -> Result<String, StateError> {
        let len = self.u32()? as usize;
        let raw = self.take(len)?;
        String::from_utf8(raw.to_vec()).map_err(|_| malformed("invalid UTF-8"))
    }
}
