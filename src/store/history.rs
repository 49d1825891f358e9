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

// Session page history - bounded map of pages in flight with oldest-first eviction

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

use crate::engine_core::models::{PageId, PageState};

#[derive(Debug, Default)]
struct Inner {
    pages: HashMap<PageId, Arc<PageState>>,
    // (sequence, page id): pages put with the same sequence still get their own slot
    order: BTreeSet<(u64, PageId)>,
}

/// Per-session history of finalized pages.
///
/// One lock guards both the lookup map and the eviction order, so `put` and
/// `get` are atomic with respect to each other and a reader never sees a page
/// that is only half inserted. Pages are immutable once stored and are
/// shared out as `Arc`s.
#[derive(Debug)]
pub struct SessionStateHistory {
    capacity: usize,
    inner: Mutex<Inner>,
}

impl SessionStateHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            inner: Mutex::new(Inner::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // every mutation below leaves Inner consistent, so a poisoned lock is still usable
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store a finalized page, evicting the oldest pages beyond capacity.
    pub fn put(&self, page: PageState) -> Arc<PageState> {
        let page = Arc::new(page);
        let mut inner = self.lock();

        if let Some(previous) = inner.pages.insert(page.page_id, Arc::clone(&page)) {
            inner.order.remove(&(previous.sequence, previous.page_id));
        }
        inner.order.insert((page.sequence, page.page_id));

        while inner.pages.len() > self.capacity {
            let Some((sequence, evicted)) = inner.order.pop_first() else {
                break;
            };
            inner.pages.remove(&evicted);
            debug!(page_id = %evicted, sequence, "Evicted page from session history");
        }

        page
    }

    pub fn get(&self, page_id: &PageId) -> Option<Arc<PageState>> {
        self.lock().pages.get(page_id).cloned()
    }

    pub fn contains(&self, page_id: &PageId) -> bool {
        self.lock().pages.contains_key(page_id)
    }

    pub fn len(&self) -> usize {
        self.lock().pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.pages.clear();
        inner.order.clear();
    }
}
