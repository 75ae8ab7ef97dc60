// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::detail::DetailView;
use crate::ids::RecipeId;
use crate::model::{FavoriteRecord, FavoritesList, Recipe};

pub const NO_FAVORITES_MESSAGE: &str = "No favorites yet — save recipes to see them here.";
pub const DETAIL_UNAVAILABLE_MESSAGE: &str = "Could not load recipe details.";

const TEASER_CHARS: usize = 150;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    Search,
    Category,
    Favorites,
}

impl ViewKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Category => "category",
            Self::Favorites => "favorites",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub id: RecipeId,
    pub name: String,
    pub thumbnail: String,
    pub is_favorite: bool,
}

impl Card {
    pub fn from_recipe(recipe: &Recipe, favorites: &FavoritesList) -> Self {
        Self {
            id: recipe.id.clone(),
            name: recipe.name.clone(),
            thumbnail: recipe.thumbnail.clone(),
            is_favorite: favorites.contains(&recipe.id),
        }
    }

    pub fn from_favorite(record: &FavoriteRecord) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            thumbnail: record.thumbnail.clone(),
            is_favorite: true,
        }
    }
}

/// What the list area should show after a view change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderPayload {
    Cards { view: ViewKind, cards: Vec<Card> },
    NoResults { view: ViewKind, message: String },
    NoFavorites { message: String },
}

impl RenderPayload {
    pub fn list(view: ViewKind, recipes: &[Recipe], favorites: &FavoritesList) -> Self {
        Self::Cards {
            view,
            cards: recipes
                .iter()
                .map(|recipe| Card::from_recipe(recipe, favorites))
                .collect(),
        }
    }

    pub fn favorites(favorites: &FavoritesList) -> Self {
        if favorites.is_empty() {
            return Self::NoFavorites {
                message: NO_FAVORITES_MESSAGE.to_owned(),
            };
        }
        Self::Cards {
            view: ViewKind::Favorites,
            cards: favorites.iter().map(Card::from_favorite).collect(),
        }
    }

    pub const fn view(&self) -> ViewKind {
        match self {
            Self::Cards { view, .. } | Self::NoResults { view, .. } => *view,
            Self::NoFavorites { .. } => ViewKind::Favorites,
        }
    }

    pub fn cards(&self) -> &[Card] {
        match self {
            Self::Cards { cards, .. } => cards,
            Self::NoResults { .. } | Self::NoFavorites { .. } => &[],
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Cards { .. } => None,
            Self::NoResults { message, .. } | Self::NoFavorites { message } => Some(message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionPayload {
    pub query: String,
    pub names: Vec<String>,
}

/// Random recipe highlighted above the result list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feature {
    pub card: Card,
    pub teaser: String,
}

impl Feature {
    pub fn from_recipe(recipe: &Recipe, favorites: &FavoritesList) -> Self {
        Self {
            card: Card::from_recipe(recipe, favorites),
            teaser: teaser(&recipe.instructions),
        }
    }

    pub fn refresh(&mut self, favorites: &FavoritesList) {
        self.card.is_favorite = favorites.contains(&self.card.id);
    }
}

fn teaser(instructions: &str) -> String {
    if instructions.is_empty() {
        return String::new();
    }
    let head: String = instructions.chars().take(TEASER_CHARS).collect();
    format!("{head}...")
}

/// Everything the core asks the rendering layer to show.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    Render(RenderPayload),
    Suggestions(SuggestionPayload),
    ClearSuggestions,
    Detail(Box<DetailView>),
    DetailUnavailable(String),
    RecipeOfDay(Feature),
    Loading(bool),
    Status(String),
}
