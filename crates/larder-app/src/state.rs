// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;

use crate::ids::{RecipeId, RequestToken, TokenCounter};
use crate::model::{FavoriteRecord, FavoritesBackend, FavoritesList, Recipe};
use crate::view::{RenderPayload, ViewKind};

#[derive(Debug, Clone, Default)]
struct ListView {
    label: String,
    results: Vec<Recipe>,
    latest: Option<RequestToken>,
}

impl ListView {
    fn no_results_message(&self, kind: ViewKind) -> String {
        match kind {
            ViewKind::Category => format!("No recipes found for category {}", self.label),
            ViewKind::Search | ViewKind::Favorites => {
                format!("No recipes found for “{}”", self.label)
            }
        }
    }

    fn render(&self, kind: ViewKind, favorites: &FavoritesList) -> RenderPayload {
        if self.results.is_empty() {
            return RenderPayload::NoResults {
                view: kind,
                message: self.no_results_message(kind),
            };
        }
        RenderPayload::list(kind, &self.results, favorites)
    }
}

/// Tracks which list drives the screen and re-derives its payload on demand.
///
/// Search and Category keep separate result caches. Only the active view's
/// cache is consulted when re-rendering or projecting favorites.
#[derive(Debug, Clone)]
pub struct ViewReconciler {
    active: ViewKind,
    search: ListView,
    category: ListView,
    tokens: TokenCounter,
}

impl Default for ViewReconciler {
    fn default() -> Self {
        Self {
            active: ViewKind::Search,
            search: ListView::default(),
            category: ListView::default(),
            tokens: TokenCounter::default(),
        }
    }
}

impl ViewReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn active(&self) -> ViewKind {
        self.active
    }

    pub fn begin_search(&mut self) -> RequestToken {
        let token = self.tokens.next();
        self.search.latest = Some(token);
        token
    }

    pub fn begin_category(&mut self) -> RequestToken {
        let token = self.tokens.next();
        self.category.latest = Some(token);
        token
    }

    /// Applies a finished search. Returns `None` when a newer search was issued
    /// after `token`.
    pub fn enter_search(
        &mut self,
        token: RequestToken,
        query: &str,
        results: Vec<Recipe>,
        favorites: &FavoritesList,
    ) -> Option<RenderPayload> {
        if self.search.latest != Some(token) {
            return None;
        }
        self.active = ViewKind::Search;
        self.search.label = query.to_owned();
        self.search.results = results;
        Some(self.search.render(ViewKind::Search, favorites))
    }

    pub fn enter_category(
        &mut self,
        token: RequestToken,
        category: &str,
        results: Vec<Recipe>,
        favorites: &FavoritesList,
    ) -> Option<RenderPayload> {
        if self.category.latest != Some(token) {
            return None;
        }
        self.active = ViewKind::Category;
        self.category.label = category.to_owned();
        self.category.results = results;
        Some(self.category.render(ViewKind::Category, favorites))
    }

    pub fn enter_favorites(&mut self, favorites: &FavoritesList) -> RenderPayload {
        self.active = ViewKind::Favorites;
        RenderPayload::favorites(favorites)
    }

    /// Re-emits the active view against `favorites` without touching the caches.
    pub fn render(&self, favorites: &FavoritesList) -> RenderPayload {
        match self.active {
            ViewKind::Search => self.search.render(ViewKind::Search, favorites),
            ViewKind::Category => self.category.render(ViewKind::Category, favorites),
            ViewKind::Favorites => RenderPayload::favorites(favorites),
        }
    }

    pub fn last_results(&self, kind: ViewKind) -> &[Recipe] {
        match kind {
            ViewKind::Search => &self.search.results,
            ViewKind::Category => &self.category.results,
            ViewKind::Favorites => &[],
        }
    }

    pub fn find_cached(&self, id: &RecipeId) -> Option<&Recipe> {
        self.last_results(self.active)
            .iter()
            .find(|recipe| &recipe.id == id)
    }

    /// Toggles `id` through `store` and re-emits the active view.
    ///
    /// Additions are projected from the active cache first, then from
    /// `fallback`. Returns `None` when `id` was not saved and neither source
    /// could project it; the caller is expected to fetch the recipe and call
    /// [`FavoritesBackend::add`] followed by [`ViewReconciler::render`].
    pub fn on_favorite_toggled<S, F>(
        &self,
        id: &RecipeId,
        store: &mut S,
        fallback: F,
    ) -> Result<Option<RenderPayload>>
    where
        S: FavoritesBackend,
        F: FnOnce() -> Option<FavoriteRecord>,
    {
        let was_favorite = store.is_favorite(id);
        let favorites = store.toggle(id, || {
            self.find_cached(id)
                .map(Recipe::to_favorite)
                .or_else(fallback)
        })?;
        if !was_favorite && !favorites.contains(id) {
            return Ok(None);
        }
        Ok(Some(self.render(favorites)))
    }
}
