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

//! State encoding and the pluggable token strategies.
//!
//! Tokens always start with `<version>.<page id>`; cipher and hash tokens
//! append one more segment holding their sealed payload.

pub mod cipher;
pub mod encoder;
pub mod hash;
pub mod memory;
pub mod strategy;
pub mod traits;

pub use encoder::StateEncoder;
pub use strategy::StrategyCodec;
pub use traits::{StateCodec, Submission};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};

use crate::engine_core::constants::token;
use crate::engine_core::models::{PageId, SessionId, Token};

/// Parsed `<version>.<page id>[.<payload>]` token.
pub(crate) struct TokenParts<'a> {
    pub page_id: PageId,
    pub payload: Option<&'a str>,
}

pub(crate) fn parse_token(token: &Token) -> Option<TokenParts<'_>> {
    let mut parts = token.as_str().split(token::SEPARATOR);
    if parts.next()? != token::VERSION {
        return None;
    }
    let page_id = parts.next()?.parse::<PageId>().ok()?;
    let payload = parts.next();
    if parts.next().is_some() || payload.is_some_and(str::is_empty) {
        return None;
    }
    Some(TokenParts { page_id, payload })
}

pub(crate) fn format_token(page_id: &PageId, payload: Option<&[u8]>) -> Token {
    match payload {
        Some(bytes) => Token::new(format!(
            "{}{}{}{}{}",
            token::VERSION,
            token::SEPARATOR,
            page_id,
            token::SEPARATOR,
            URL_SAFE_NO_PAD.encode(bytes)
        )),
        None => Token::new(format!("{}{}{}", token::VERSION, token::SEPARATOR, page_id)),
    }
}

pub(crate) fn decode_payload(payload: &str) -> Option<Vec<u8>> {
    URL_SAFE_NO_PAD.decode(payload).ok()
}

/// Bytes that bind a sealed payload to its session and page.
pub(crate) fn binding(session: &SessionId, page_id: &PageId) -> Vec<u8> {
    let mut out = Vec::with_capacity(token::VERSION.len() + 32);
    out.extend_from_slice(token::VERSION.as_bytes());
    out.extend_from_slice(session.as_bytes());
    out.extend_from_slice(page_id.as_bytes());
    out
}
