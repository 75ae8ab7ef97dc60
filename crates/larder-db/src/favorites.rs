// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use larder_app::{FavoriteRecord, FavoritesBackend, FavoritesList, RecipeId};

use crate::Store;

pub const FAVORITES_KEY: &str = "favorites";

/// The favorites list plus the storage it is mirrored to.
///
/// Memory and disk stay in step: every mutation rewrites the whole list
/// before returning, and a failed write restores the previous list.
pub struct FavoritesStore {
    store: Store,
    favorites: FavoritesList,
}

impl FavoritesStore {
    /// Reads the persisted list. Missing, unreadable or malformed data yields
    /// an empty list.
    pub fn load(store: Store) -> Self {
        let favorites = match store.get_value(FAVORITES_KEY) {
            Ok(Some(raw)) => serde_json::from_str::<FavoritesList>(&raw).unwrap_or_else(|error| {
                tracing::warn!(%error, "stored favorites are malformed; starting empty");
                FavoritesList::new()
            }),
            Ok(None) => FavoritesList::new(),
            Err(error) => {
                tracing::warn!(error = format!("{error:#}"), "cannot read favorites; starting empty");
                FavoritesList::new()
            }
        };
        tracing::debug!(count = favorites.len(), "favorites loaded");
        Self { store, favorites }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn save(&self) -> Result<()> {
        let raw = serde_json::to_string(&self.favorites).context("encode favorites")?;
        self.store.put_value(FAVORITES_KEY, &raw)
    }

    fn commit(&mut self, previous: FavoritesList) -> Result<()> {
        if let Err(error) = self.save() {
            self.favorites = previous;
            return Err(error.context("persist favorites"));
        }
        Ok(())
    }
}

impl FavoritesBackend for FavoritesStore {
    fn favorites(&self) -> &FavoritesList {
        &self.favorites
    }

    fn toggle<F>(&mut self, id: &RecipeId, projector: F) -> Result<&FavoritesList>
    where
        F: FnOnce() -> Option<FavoriteRecord>,
    {
        let previous = self.favorites.clone();
        self.favorites.toggle(id, projector)?;
        if self.favorites != previous {
            self.commit(previous)?;
            tracing::debug!(id = %id, saved = self.favorites.contains(id), "favorite toggled");
        }
        Ok(&self.favorites)
    }

    fn add(&mut self, record: FavoriteRecord) -> Result<bool> {
        let previous = self.favorites.clone();
        if !self.favorites.push(record) {
            return Ok(false);
        }
        self.commit(previous)?;
        Ok(true)
    }
}
