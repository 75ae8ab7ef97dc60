// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::ids::RecipeId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ingredient {
    pub name: String,
    pub measure: String,
}

/// A full dish record as returned by the catalog. Never mutated after decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recipe {
    pub id: RecipeId,
    pub name: String,
    pub thumbnail: String,
    pub category: String,
    pub area: String,
    pub instructions: String,
    pub ingredients: Vec<Ingredient>,
    pub video_url: Option<String>,
}

impl Recipe {
    pub fn to_favorite(&self) -> FavoriteRecord {
        FavoriteRecord {
            id: self.id.clone(),
            name: self.name.clone(),
            thumbnail: self.thumbnail.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FavoriteRecord {
    pub id: RecipeId,
    pub name: String,
    #[serde(rename = "img")]
    pub thumbnail: String,
}

/// Saved recipes in insertion order, unique by id.
///
/// Deserializing drops later duplicates so a hand-edited blob cannot break the
/// uniqueness invariant.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<FavoriteRecord>", into = "Vec<FavoriteRecord>")]
pub struct FavoritesList {
    records: Vec<FavoriteRecord>,
}

impl FavoritesList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[FavoriteRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &FavoriteRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, id: &RecipeId) -> bool {
        self.records.iter().any(|record| &record.id == id)
    }

    pub fn get(&self, id: &RecipeId) -> Option<&FavoriteRecord> {
        self.records.iter().find(|record| &record.id == id)
    }

    /// Appends `record` unless its id is already saved. Returns whether it was added.
    pub fn push(&mut self, record: FavoriteRecord) -> bool {
        if self.contains(&record.id) {
            return false;
        }
        self.records.push(record);
        true
    }

    pub fn remove(&mut self, id: &RecipeId) -> Option<FavoriteRecord> {
        let index = self.records.iter().position(|record| &record.id == id)?;
        Some(self.records.remove(index))
    }
}

impl From<Vec<FavoriteRecord>> for FavoritesList {
    fn from(records: Vec<FavoriteRecord>) -> Self {
        let mut list = Self::new();
        for record in records {
            list.push(record);
        }
        list
    }
}

impl From<FavoritesList> for Vec<FavoriteRecord> {
    fn from(list: FavoritesList) -> Self {
        list.records
    }
}

/// Mutation surface shared by the in-memory list and the persisted store.
pub trait FavoritesBackend {
    fn favorites(&self) -> &FavoritesList;

    /// Removes `id` if saved, otherwise appends the record produced by
    /// `projector`. A projector returning `None` leaves the list unchanged.
    fn toggle<F>(&mut self, id: &RecipeId, projector: F) -> Result<&FavoritesList>
    where
        F: FnOnce() -> Option<FavoriteRecord>;

    fn add(&mut self, record: FavoriteRecord) -> Result<bool>;

    fn is_favorite(&self, id: &RecipeId) -> bool {
        self.favorites().contains(id)
    }
}

impl FavoritesBackend for FavoritesList {
    fn favorites(&self) -> &FavoritesList {
        self
    }

    fn toggle<F>(&mut self, id: &RecipeId, projector: F) -> Result<&FavoritesList>
    where
        F: FnOnce() -> Option<FavoriteRecord>,
    {
        if self.remove(id).is_none()
            && let Some(mut record) = projector()
        {
            record.id = id.clone();
            self.push(record);
        }
        Ok(&*self)
    }

    fn add(&mut self, record: FavoriteRecord) -> Result<bool> {
        Ok(self.push(record))
    }
}
