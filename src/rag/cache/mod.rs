
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use anyhow::anyhow;
use tracing::debug;

use super::Answerer;
use crate::Result;

#[derive(Debug, Default)]
struct CacheState {
    answers: HashMap<String, String>,
    insertion_order: VecDeque<String>,
}

/// Memoises successful answers by exact query text.
///
/// Holds at most `max_entries` answers; the oldest insertion is evicted first.
/// Failures pass through and are never stored.
pub struct CachedAnswerer<A> {
    inner: A,
    max_entries: usize,
    state: Mutex<CacheState>,
}

impl<A: Answerer> CachedAnswerer<A> {
    #[inline]
    pub fn new(inner: A, max_entries: usize) -> Self {
        Self {
            inner,
            max_entries: max_entries.max(1),
            state: Mutex::new(CacheState::default()),
        }
    }

    #[inline]
    pub fn inner(&self) -> &A {
        &self.inner
    }

    /// Number of cached answers
    #[inline]
    pub fn len(&self) -> usize {
        self.state
            .lock()
            .map(|state| state.answers.len())
            .unwrap_or_default()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup(&self, query: &str) -> Result<Option<String>> {
        let state = self
            .state
            .lock()
            .map_err(|e| anyhow!("Answer cache lock poisoned: {}", e))?;
        Ok(state.answers.get(query).cloned())
    }

    fn store(&self, query: &str, answer: &str) -> Result<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|e| anyhow!("Answer cache lock poisoned: {}", e))?;

        if state.answers.contains_key(query) {
            return Ok(());
        }

        while state.answers.len() >= self.max_entries {
            let Some(oldest) = state.insertion_order.pop_front() else {
                break;
            };
            state.answers.remove(&oldest);
            debug!("Evicted oldest cached answer");
        }

        state.answers.insert(query.to_string(), answer.to_string());
        state.insertion_order.push_back(query.to_string());
        Ok(())
    }
}

impl<A: Answerer> Answerer for CachedAnswerer<A> {
    #[inline]
    fn answer(&self, query: &str) -> Result<String> {
        if let Some(cached) = self.lookup(query)? {
            debug!("Answer cache hit");
            return Ok(cached);
        }

        let answer = self.inner.answer(query)?;
        self.store(query, &answer)?;
        Ok(answer)
    }
}
