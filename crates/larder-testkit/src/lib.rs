// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use larder_app::{FavoriteRecord, Ingredient, Recipe, RecipeId};
use larder_catalog::{CatalogError, CatalogResult, RecipeCatalog, StatusCode};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

const DISH_BASES: [&str; 14] = [
    "Stew",
    "Pie",
    "Curry",
    "Risotto",
    "Tagine",
    "Casserole",
    "Stir Fry",
    "Salad",
    "Soup",
    "Roast",
    "Bake",
    "Skewers",
    "Noodles",
    "Tart",
];

const DISH_PROTEINS: [&str; 10] = [
    "Beef", "Chicken", "Lamb", "Pork", "Salmon", "Prawn", "Tofu", "Mushroom", "Duck", "Chickpea",
];

const CATEGORIES: [&str; 8] = [
    "Beef",
    "Chicken",
    "Dessert",
    "Lamb",
    "Pasta",
    "Seafood",
    "Vegetarian",
    "Side",
];

const AREAS: [&str; 8] = [
    "British", "Indian", "Italian", "Moroccan", "Chinese", "Mexican", "French", "Thai",
];

const PANTRY: [(&str, &str); 10] = [
    ("Onion", "1 chopped"),
    ("Garlic", "2 cloves"),
    ("Olive Oil", "2 tbs"),
    ("Salt", "pinch"),
    ("Black Pepper", "1 tsp"),
    ("Tomato Puree", "1 tbs"),
    ("Stock", "500ml"),
    ("Butter", "25g"),
    ("Thyme", "sprig"),
    ("Rice", "300g"),
];

#[derive(Debug, Clone)]
struct DeterministicRng {
    state: u64,
}

impl DeterministicRng {
    fn new(seed: u64) -> Self {
        let mut state = seed ^ 0x9E37_79B9_7F4A_7C15;
        if state == 0 {
            state = 0xA409_3822_299F_31D0;
        }
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);

        let mut x = self.state;
        x ^= x >> 13;
        x ^= x << 7;
        x ^= x >> 17;
        x
    }

    fn int_n(&mut self, n: usize) -> usize {
        if n <= 1 {
            return 0;
        }
        (self.next_u64() % (n as u64)) as usize
    }
}

/// Deterministic recipe generator for tests.
#[derive(Debug, Clone)]
pub struct RecipeFaker {
    rng: DeterministicRng,
    next_id: u64,
}

impl RecipeFaker {
    pub fn new(seed: u64) -> Self {
        let normalized = if seed == 0 { 1 } else { seed };
        Self {
            rng: DeterministicRng::new(normalized),
            next_id: 52_000,
        }
    }

    pub fn int_n(&mut self, n: usize) -> usize {
        self.rng.int_n(n)
    }

    pub fn recipe(&mut self) -> Recipe {
        self.next_id += 1;
        let protein = self.pick(&DISH_PROTEINS);
        let base = self.pick(&DISH_BASES);
        let ingredient_count = 1 + self.int_n(PANTRY.len());
        let mut ingredients = vec![Ingredient {
            name: protein.to_owned(),
            measure: "500g".to_owned(),
        }];
        ingredients.extend(PANTRY.iter().take(ingredient_count).map(|(name, measure)| {
            Ingredient {
                name: (*name).to_owned(),
                measure: (*measure).to_owned(),
            }
        }));

        Recipe {
            id: RecipeId::new(self.next_id.to_string()),
            name: format!("{protein} {base}"),
            thumbnail: format!(
                "https://www.themealdb.com/images/media/meals/{}.jpg",
                self.next_id
            ),
            category: self.pick(&CATEGORIES).to_owned(),
            area: self.pick(&AREAS).to_owned(),
            instructions: format!("Prepare the {protein}. Cook the {base} slowly. Serve."),
            ingredients,
            video_url: None,
        }
    }

    pub fn recipes(&mut self, count: usize) -> Vec<Recipe> {
        (0..count).map(|_| self.recipe()).collect()
    }

    fn pick<'a>(&mut self, values: &'a [&'a str]) -> &'a str {
        values[self.int_n(values.len())]
    }
}

pub fn recipe(id: &str, name: &str) -> Recipe {
    Recipe {
        id: RecipeId::from(id),
        name: name.to_owned(),
        thumbnail: format!("https://img.example/{id}.jpg"),
        category: String::new(),
        area: String::new(),
        instructions: String::new(),
        ingredients: Vec::new(),
        video_url: None,
    }
}

pub fn beef_stew() -> Recipe {
    Recipe {
        id: RecipeId::from("52874"),
        name: "Beef Stew".to_owned(),
        thumbnail: "u1".to_owned(),
        category: "Beef".to_owned(),
        area: "British".to_owned(),
        instructions: "Brown the beef. Add stock and simmer for two hours.".to_owned(),
        ingredients: vec![
            Ingredient {
                name: "Beef".to_owned(),
                measure: "1kg".to_owned(),
            },
            Ingredient {
                name: "Stock".to_owned(),
                measure: "500ml".to_owned(),
            },
        ],
        video_url: Some("https://www.youtube.com/watch?v=stew".to_owned()),
    }
}

pub fn favorite(id: &str, name: &str, thumbnail: &str) -> FavoriteRecord {
    FavoriteRecord {
        id: RecipeId::from(id),
        name: name.to_owned(),
        thumbnail: thumbnail.to_owned(),
    }
}

pub fn temp_db_path() -> Result<(tempfile::TempDir, PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let db_path = dir.path().join("larder.db");
    Ok((dir, db_path))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogCall {
    Search(String),
    Category(String),
    Lookup(RecipeId),
    Random,
    Categories,
}

#[derive(Debug, Default)]
struct Script {
    searches: HashMap<String, Vec<Recipe>>,
    categories: HashMap<String, Vec<Recipe>>,
    recipes: HashMap<RecipeId, Recipe>,
    random: Option<Recipe>,
    category_names: Vec<String>,
    delays: HashMap<String, Duration>,
    failing: bool,
    calls: Vec<CatalogCall>,
}

/// In-memory catalog with canned answers and a call log.
///
/// Unknown queries answer with an empty list, like the real service. Delays
/// are keyed by search query or category and use tokio's clock, so paused-time
/// tests stay deterministic.
#[derive(Debug, Clone, Default)]
pub struct ScriptedCatalog {
    script: Arc<Mutex<Script>>,
}

impl ScriptedCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        match self.script.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn with_search(self, query: &str, recipes: Vec<Recipe>) -> Self {
        {
            let mut script = self.script();
            for recipe in &recipes {
                script.recipes.insert(recipe.id.clone(), recipe.clone());
            }
            script.searches.insert(query.to_owned(), recipes);
        }
        self
    }

    pub fn with_category(self, category: &str, recipes: Vec<Recipe>) -> Self {
        {
            let mut script = self.script();
            for recipe in &recipes {
                script.recipes.insert(recipe.id.clone(), recipe.clone());
            }
            script.categories.insert(category.to_owned(), recipes);
        }
        self
    }

    pub fn with_recipe(self, recipe: Recipe) -> Self {
        self.script().recipes.insert(recipe.id.clone(), recipe);
        self
    }

    pub fn with_random(self, recipe: Recipe) -> Self {
        {
            let mut script = self.script();
            script.recipes.insert(recipe.id.clone(), recipe.clone());
            script.random = Some(recipe);
        }
        self
    }

    pub fn with_category_names(self, names: &[&str]) -> Self {
        self.script().category_names = names.iter().map(|name| (*name).to_owned()).collect();
        self
    }

    pub fn with_delay(self, key: &str, delay: Duration) -> Self {
        self.script().delays.insert(key.to_owned(), delay);
        self
    }

    pub fn set_failing(&self, failing: bool) {
        self.script().failing = failing;
    }

    pub fn calls(&self) -> Vec<CatalogCall> {
        self.script().calls.clone()
    }

    pub fn search_queries(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                CatalogCall::Search(query) => Some(query),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: CatalogCall, delay_key: Option<&str>) -> (bool, Option<Duration>) {
        let mut script = self.script();
        script.calls.push(call);
        let delay = delay_key.and_then(|key| script.delays.get(key).copied());
        (script.failing, delay)
    }

    async fn settle(&self, failing: bool, delay: Option<Duration>) -> CatalogResult<()> {
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if failing {
            return Err(CatalogError::Status {
                url: "scripted://catalog".to_owned(),
                status: StatusCode::SERVICE_UNAVAILABLE,
            });
        }
        Ok(())
    }
}

impl RecipeCatalog for ScriptedCatalog {
    async fn search_by_name(&self, query: &str) -> CatalogResult<Vec<Recipe>> {
        let (failing, delay) = self.record(CatalogCall::Search(query.to_owned()), Some(query));
        self.settle(failing, delay).await?;
        Ok(self.script().searches.get(query).cloned().unwrap_or_default())
    }

    async fn filter_by_category(&self, category: &str) -> CatalogResult<Vec<Recipe>> {
        let (failing, delay) =
            self.record(CatalogCall::Category(category.to_owned()), Some(category));
        self.settle(failing, delay).await?;
        Ok(self
            .script()
            .categories
            .get(category)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_by_id(&self, id: &RecipeId) -> CatalogResult<Option<Recipe>> {
        let (failing, delay) = self.record(CatalogCall::Lookup(id.clone()), Some(id.as_str()));
        self.settle(failing, delay).await?;
        Ok(self.script().recipes.get(id).cloned())
    }

    async fn get_random(&self) -> CatalogResult<Option<Recipe>> {
        let (failing, delay) = self.record(CatalogCall::Random, Some("random"));
        self.settle(failing, delay).await?;
        Ok(self.script().random.clone())
    }

    async fn list_categories(&self) -> CatalogResult<Vec<String>> {
        let (failing, delay) = self.record(CatalogCall::Categories, None);
        self.settle(failing, delay).await?;
        Ok(self.script().category_names.clone())
    }
}
