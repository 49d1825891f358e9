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

//! Glob matching for request targets and parameter names.
//!
//! `*` matches any run of characters (including none); everything else
//! matches literally. A lone `*` matches everything.

use crate::validator::ParameterWhitelist;

pub fn match_pattern(candidate: &str, pattern: &str) -> bool {
    if pattern == "*" {
        return true;
    }
    if !pattern.contains('*') {
        return candidate == pattern;
    }

    let mut pieces = pattern.split('*');
    // split always yields at least one piece
    let first = pieces.next().unwrap_or_default();
    let Some(mut rest) = candidate.strip_prefix(first) else {
        return false;
    };

    let pieces: Vec<&str> = pieces.collect();
    let Some((last, middle)) = pieces.split_last() else {
        return rest.is_empty();
    };
    for piece in middle {
        match rest.find(piece) {
            Some(at) => rest = &rest[at + piece.len()..],
            None => return false,
        }
    }
    rest.len() >= last.len() && rest.ends_with(last)
}

/// A list of glob patterns; matches when any of them does.
#[derive(Debug, Clone, Default)]
pub struct PatternWhitelist {
    patterns: Vec<String>,
}

impl PatternWhitelist {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns.into_iter().map(Into::into).collect(),
        }
    }

    pub fn matches(&self, candidate: &str) -> bool {
        self.patterns.iter().any(|p| match_pattern(candidate, p))
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

impl ParameterWhitelist for PatternWhitelist {
    fn is_whitelisted(&self, _target: &str, parameter: &str) -> bool {
        self.matches(parameter)
    }
}
