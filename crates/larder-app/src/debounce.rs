// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::time::Duration;

use crate::ids::{RequestToken, TokenCounter};
use crate::model::Recipe;
use crate::view::SuggestionPayload;

pub const DEFAULT_QUIET_PERIOD: Duration = Duration::from_millis(220);
pub const DEFAULT_MIN_CHARS: usize = 2;
pub const DEFAULT_SUGGESTION_LIMIT: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DebounceAction {
    Clear,
    Schedule { token: RequestToken, query: String },
}

/// Keystroke-to-lookup state for the suggestion dropdown.
///
/// Each accepted keystroke supersedes the previous one. Timers and lookups
/// are driven elsewhere; this type only decides which token is current.
#[derive(Debug, Clone)]
pub struct Debouncer {
    min_chars: usize,
    limit: usize,
    tokens: TokenCounter,
    pending: Option<RequestToken>,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_CHARS, DEFAULT_SUGGESTION_LIMIT)
    }
}

impl Debouncer {
    pub fn new(min_chars: usize, limit: usize) -> Self {
        Self {
            min_chars,
            limit,
            tokens: TokenCounter::default(),
            pending: None,
        }
    }

    pub fn input(&mut self, text: &str) -> DebounceAction {
        let query = text.trim();
        if query.chars().count() < self.min_chars {
            self.pending = None;
            return DebounceAction::Clear;
        }
        let token = self.tokens.next();
        self.pending = Some(token);
        DebounceAction::Schedule {
            token,
            query: query.to_owned(),
        }
    }

    pub fn is_current(&self, token: RequestToken) -> bool {
        self.pending == Some(token)
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    /// Turns lookup results into a dropdown payload, or `None` if a later
    /// keystroke superseded `token`.
    pub fn accept(
        &mut self,
        token: RequestToken,
        query: &str,
        recipes: &[Recipe],
    ) -> Option<SuggestionPayload> {
        if !self.is_current(token) {
            return None;
        }
        self.pending = None;
        Some(SuggestionPayload {
            query: query.to_owned(),
            names: recipes
                .iter()
                .take(self.limit)
                .map(|recipe| recipe.name.clone())
                .collect(),
        })
    }
}
