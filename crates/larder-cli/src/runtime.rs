// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use larder_app::{
    DETAIL_UNAVAILABLE_MESSAGE, DEFAULT_MIN_CHARS, DEFAULT_QUIET_PERIOD, DEFAULT_SUGGESTION_LIMIT,
    DebounceAction, Debouncer, DetailView, FavoritesBackend, Feature, Recipe, RecipeId,
    RequestToken, TokenCounter, UiEvent, ViewReconciler,
};
use larder_catalog::{RecipeCatalog, recipe_or_none, recipes_or_empty};
use larder_db::FavoritesStore;
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::config::DEFAULT_CATEGORIES;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    pub quiet_period: Duration,
    pub min_suggestion_chars: usize,
    pub suggestion_limit: usize,
    pub initial_query: String,
    pub initial_limit: usize,
    /// Fixed category names; `None` asks the catalog at startup.
    pub categories: Option<Vec<String>>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            quiet_period: DEFAULT_QUIET_PERIOD,
            min_suggestion_chars: DEFAULT_MIN_CHARS,
            suggestion_limit: DEFAULT_SUGGESTION_LIMIT,
            initial_query: "chicken".to_owned(),
            initial_limit: 12,
            categories: None,
        }
    }
}

/// Result of a background task, applied on the UI thread.
#[derive(Debug)]
enum Completion {
    Featured(Option<Recipe>),
    Search {
        token: RequestToken,
        query: String,
        recipes: Vec<Recipe>,
        initial: bool,
    },
    Category {
        token: RequestToken,
        category: String,
        recipes: Vec<Recipe>,
    },
    SuggestionDue {
        token: RequestToken,
        query: String,
    },
    Suggestions {
        token: RequestToken,
        query: String,
        recipes: Vec<Recipe>,
    },
    Detail {
        token: RequestToken,
        recipe: Option<Recipe>,
    },
    Favorite {
        id: RecipeId,
        recipe: Option<Recipe>,
    },
    Categories(Vec<String>),
}

impl Completion {
    /// Whether the task counted towards the loading indicator.
    const fn tracked(&self) -> bool {
        !matches!(
            self,
            Self::SuggestionDue { .. } | Self::Suggestions { .. } | Self::Categories(_)
        )
    }
}

/// One user's recipe session.
///
/// Owns the favorites, the view state and the debouncer. Catalog lookups run
/// on the tokio runtime behind `handle` and only report back through the
/// completion channel, so no state here is shared across threads.
pub struct Session<C> {
    catalog: Arc<C>,
    favorites: FavoritesStore,
    reconciler: ViewReconciler,
    debouncer: Debouncer,
    settings: SessionSettings,
    categories: Vec<String>,
    featured: Option<Recipe>,
    feature: Option<Feature>,
    detail_tokens: TokenCounter,
    latest_detail: Option<RequestToken>,
    pending_favorites: HashSet<RecipeId>,
    in_flight: usize,
    handle: Handle,
    tx: UnboundedSender<Completion>,
    rx: UnboundedReceiver<Completion>,
}

impl<C: RecipeCatalog + 'static> Session<C> {
    pub fn new(
        catalog: C,
        favorites: FavoritesStore,
        settings: SessionSettings,
        handle: Handle,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let categories = settings.categories.clone().unwrap_or_else(|| {
            DEFAULT_CATEGORIES
                .iter()
                .map(|name| (*name).to_owned())
                .collect()
        });
        Self {
            catalog: Arc::new(catalog),
            favorites,
            reconciler: ViewReconciler::new(),
            debouncer: Debouncer::new(settings.min_suggestion_chars, settings.suggestion_limit),
            settings,
            categories,
            featured: None,
            feature: None,
            detail_tokens: TokenCounter::default(),
            latest_detail: None,
            pending_favorites: HashSet::new(),
            in_flight: 0,
            handle,
            tx,
            rx,
        }
    }

    fn spawn<F>(&self, task: F)
    where
        F: Future<Output = Completion> + Send + 'static,
    {
        let tx = self.tx.clone();
        self.handle.spawn(async move {
            // The receiver only goes away with the session.
            let _ = tx.send(task.await);
        });
    }

    fn spawn_lookup<F>(&mut self, events: &mut Vec<UiEvent>, task: F)
    where
        F: Future<Output = Completion> + Send + 'static,
    {
        if self.in_flight == 0 {
            events.push(UiEvent::Loading(true));
        }
        self.in_flight += 1;
        self.spawn(task);
    }

    fn finish_lookup(&mut self, events: &mut Vec<UiEvent>) {
        self.in_flight = self.in_flight.saturating_sub(1);
        if self.in_flight == 0 {
            events.push(UiEvent::Loading(false));
        }
    }

    fn dispatch_search(&mut self, events: &mut Vec<UiEvent>, query: String, initial: bool) {
        let token = self.reconciler.begin_search();
        tracing::debug!(%query, token = token.get(), initial, "search dispatched");
        let catalog = Arc::clone(&self.catalog);
        self.spawn_lookup(events, async move {
            let recipes = recipes_or_empty("search", catalog.search_by_name(&query).await);
            Completion::Search {
                token,
                query,
                recipes,
                initial,
            }
        });
    }

    fn dispatch_detail<F, Fut>(&mut self, events: &mut Vec<UiEvent>, fetch: F)
    where
        F: FnOnce(Arc<C>) -> Fut,
        Fut: Future<Output = Option<Recipe>> + Send + 'static,
    {
        let token = self.detail_tokens.next();
        self.latest_detail = Some(token);
        let lookup = fetch(Arc::clone(&self.catalog));
        self.spawn_lookup(events, async move {
            Completion::Detail {
                token,
                recipe: lookup.await,
            }
        });
    }

    fn push_feature_refresh(&mut self, events: &mut Vec<UiEvent>) {
        if let Some(feature) = &mut self.feature {
            feature.refresh(self.favorites.favorites());
            events.push(UiEvent::RecipeOfDay(feature.clone()));
        }
    }

    fn apply(&mut self, completion: Completion) -> Vec<UiEvent> {
        let mut events = Vec::new();
        let tracked = completion.tracked();
        match completion {
            Completion::Featured(Some(recipe)) => {
                let feature = Feature::from_recipe(&recipe, self.favorites.favorites());
                events.push(UiEvent::RecipeOfDay(feature.clone()));
                self.feature = Some(feature);
                self.featured = Some(recipe);
            }
            Completion::Featured(None) => {}
            Completion::Search {
                token,
                query,
                mut recipes,
                initial,
            } => {
                if initial {
                    recipes.truncate(self.settings.initial_limit);
                }
                if initial && recipes.is_empty() {
                    tracing::debug!(%query, "initial search found nothing");
                } else {
                    match self.reconciler.enter_search(
                        token,
                        &query,
                        recipes,
                        self.favorites.favorites(),
                    ) {
                        Some(payload) => events.push(UiEvent::Render(payload)),
                        None => tracing::debug!(%query, token = token.get(), "stale search discarded"),
                    }
                }
            }
            Completion::Category {
                token,
                category,
                recipes,
            } => match self.reconciler.enter_category(
                token,
                &category,
                recipes,
                self.favorites.favorites(),
            ) {
                Some(payload) => events.push(UiEvent::Render(payload)),
                None => tracing::debug!(%category, token = token.get(), "stale category discarded"),
            },
            Completion::SuggestionDue { token, query } => {
                if self.debouncer.is_current(token) {
                    let catalog = Arc::clone(&self.catalog);
                    self.spawn(async move {
                        let recipes =
                            recipes_or_empty("suggestions", catalog.search_by_name(&query).await);
                        Completion::Suggestions {
                            token,
                            query,
                            recipes,
                        }
                    });
                }
            }
            Completion::Suggestions {
                token,
                query,
                recipes,
            } => match self.debouncer.accept(token, &query, &recipes) {
                Some(payload) if payload.names.is_empty() => {
                    events.push(UiEvent::ClearSuggestions);
                }
                Some(payload) => events.push(UiEvent::Suggestions(payload)),
                None => tracing::debug!(%query, "superseded suggestions dropped"),
            },
            Completion::Detail { token, recipe } => {
                if self.latest_detail == Some(token) {
                    events.push(match recipe {
                        Some(recipe) => UiEvent::Detail(Box::new(DetailView::from_recipe(&recipe))),
                        None => UiEvent::DetailUnavailable(DETAIL_UNAVAILABLE_MESSAGE.to_owned()),
                    });
                }
            }
            Completion::Favorite { id, .. } if !self.pending_favorites.remove(&id) => {
                tracing::debug!(id = %id, "cancelled favorite fetch discarded");
            }
            Completion::Favorite { id, recipe } => match recipe {
                Some(recipe) => match self.favorites.add(recipe.to_favorite()) {
                    Ok(_) => {
                        events.push(UiEvent::Render(
                            self.reconciler.render(self.favorites.favorites()),
                        ));
                        self.push_feature_refresh(&mut events);
                        events.push(UiEvent::Status(format!("saved {}", recipe.name)));
                    }
                    Err(error) => {
                        tracing::warn!(id = %id, error = format!("{error:#}"), "cannot save favorite");
                        events.push(UiEvent::Status(format!("save failed: {error:#}")));
                    }
                },
                None => {
                    events.push(UiEvent::Status(format!("could not load recipe {id} to save")));
                }
            },
            Completion::Categories(names) => {
                if self.settings.categories.is_none() && !names.is_empty() {
                    tracing::debug!(count = names.len(), "categories loaded from catalog");
                    self.categories = names;
                }
            }
        }
        if tracked {
            self.finish_lookup(&mut events);
        }
        events
    }
}

impl<C: RecipeCatalog + 'static> larder_tui::AppRuntime for Session<C> {
    fn start(&mut self) -> Vec<UiEvent> {
        tracing::info!(
            favorites = self.favorites.favorites().len(),
            query = %self.settings.initial_query,
            "session started"
        );
        let mut events = Vec::new();

        let catalog = Arc::clone(&self.catalog);
        self.spawn_lookup(&mut events, async move {
            Completion::Featured(recipe_or_none("random", catalog.get_random().await))
        });

        let query = self.settings.initial_query.clone();
        self.dispatch_search(&mut events, query, true);

        if self.settings.categories.is_none() {
            let catalog = Arc::clone(&self.catalog);
            self.spawn(async move {
                let names = catalog.list_categories().await.unwrap_or_else(|error| {
                    tracing::warn!(%error, "cannot list categories; keeping defaults");
                    Vec::new()
                });
                Completion::Categories(names)
            });
        }
        events
    }

    fn search(&mut self, query: &str) -> Vec<UiEvent> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }
        self.debouncer.cancel();
        let mut events = vec![UiEvent::ClearSuggestions];
        self.dispatch_search(&mut events, query.to_owned(), false);
        events
    }

    fn filter_category(&mut self, category: &str) -> Vec<UiEvent> {
        let token = self.reconciler.begin_category();
        let category = category.to_owned();
        tracing::debug!(%category, token = token.get(), "category dispatched");
        let catalog = Arc::clone(&self.catalog);
        let mut events = Vec::new();
        self.spawn_lookup(&mut events, async move {
            let recipes = recipes_or_empty("category", catalog.filter_by_category(&category).await);
            Completion::Category {
                token,
                category,
                recipes,
            }
        });
        events
    }

    fn show_favorites(&mut self) -> Vec<UiEvent> {
        vec![UiEvent::Render(
            self.reconciler.enter_favorites(self.favorites.favorites()),
        )]
    }

    fn toggle_favorite(&mut self, id: &RecipeId) -> Result<Vec<UiEvent>> {
        let featured = self
            .featured
            .as_ref()
            .filter(|recipe| &recipe.id == id)
            .map(Recipe::to_favorite);
        let mut events = Vec::new();

        // A second toggle while the first fetch is pending undoes it.
        if self.pending_favorites.remove(id) {
            events.push(UiEvent::Status(format!("cancelled saving recipe {id}")));
            return Ok(events);
        }

        match self
            .reconciler
            .on_favorite_toggled(id, &mut self.favorites, || featured)?
        {
            Some(payload) => {
                events.push(UiEvent::Render(payload));
                self.push_feature_refresh(&mut events);
                let status = match self.favorites.favorites().get(id) {
                    Some(record) => format!("saved {}", record.name),
                    None => "removed from favorites".to_owned(),
                };
                events.push(UiEvent::Status(status));
            }
            None => {
                tracing::debug!(id = %id, "favorite not cached; fetching");
                let catalog = Arc::clone(&self.catalog);
                let id = id.clone();
                self.pending_favorites.insert(id.clone());
                self.spawn_lookup(&mut events, async move {
                    let recipe = recipe_or_none("lookup", catalog.get_by_id(&id).await);
                    Completion::Favorite { id, recipe }
                });
            }
        }
        Ok(events)
    }

    fn open_details(&mut self, id: &RecipeId) -> Vec<UiEvent> {
        let id = id.clone();
        let mut events = Vec::new();
        self.dispatch_detail(&mut events, move |catalog| async move {
            recipe_or_none("lookup", catalog.get_by_id(&id).await)
        });
        events
    }

    fn random_recipe(&mut self) -> Vec<UiEvent> {
        let mut events = Vec::new();
        self.dispatch_detail(&mut events, |catalog| async move {
            recipe_or_none("random", catalog.get_random().await)
        });
        events
    }

    fn suggestion_input(&mut self, text: &str) -> Vec<UiEvent> {
        match self.debouncer.input(text) {
            DebounceAction::Clear => vec![UiEvent::ClearSuggestions],
            DebounceAction::Schedule { token, query } => {
                let quiet_period = self.settings.quiet_period;
                self.spawn(async move {
                    tokio::time::sleep(quiet_period).await;
                    Completion::SuggestionDue { token, query }
                });
                Vec::new()
            }
        }
    }

    fn select_suggestion(&mut self, name: &str) -> Vec<UiEvent> {
        self.search(name)
    }

    fn categories(&self) -> &[String] {
        &self.categories
    }

    fn poll_events(&mut self) -> Vec<UiEvent> {
        let mut events = Vec::new();
        while let Ok(completion) = self.rx.try_recv() {
            events.extend(self.apply(completion));
        }
        events
    }
}
