// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::ids::RecipeId;
use crate::model::Recipe;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailView {
    pub id: RecipeId,
    pub title: String,
    pub thumbnail: String,
    pub subtitle: String,
    pub ingredients: Vec<String>,
    pub instructions: String,
    pub video_url: Option<String>,
}

impl DetailView {
    pub fn from_recipe(recipe: &Recipe) -> Self {
        Self {
            id: recipe.id.clone(),
            title: recipe.name.clone(),
            thumbnail: recipe.thumbnail.clone(),
            subtitle: format!("Category: {} • Area: {}", recipe.category, recipe.area),
            ingredients: recipe
                .ingredients
                .iter()
                .map(|ingredient| format!("{} — {}", ingredient.name, ingredient.measure))
                .collect(),
            instructions: recipe.instructions.clone(),
            video_url: recipe.video_url.clone(),
        }
    }
}
