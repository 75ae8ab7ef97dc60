// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, bail};
use larder_app::{Ingredient, Recipe, RecipeId};
use reqwest::Client as HttpClient;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub use reqwest::StatusCode;

pub const DEFAULT_BASE_URL: &str = "https://www.themealdb.com/api/json/v1/1";

const INGREDIENT_SLOTS: usize = 20;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("cannot reach recipe catalog at {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("recipe catalog returned {status} for {url}")]
    Status { url: String, status: StatusCode },
    #[error("decode recipe catalog response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("build recipe catalog url: {0}")]
    Url(#[from] url::ParseError),
}

pub type CatalogResult<T> = std::result::Result<T, CatalogError>;

/// Read-only lookups against a recipe catalog.
///
/// A lookup with no match succeeds with an empty list or `None`; `Err` is
/// reserved for transport, status and decode failures.
pub trait RecipeCatalog: Send + Sync {
    fn search_by_name(
        &self,
        query: &str,
    ) -> impl Future<Output = CatalogResult<Vec<Recipe>>> + Send;

    fn filter_by_category(
        &self,
        category: &str,
    ) -> impl Future<Output = CatalogResult<Vec<Recipe>>> + Send;

    fn get_by_id(&self, id: &RecipeId)
    -> impl Future<Output = CatalogResult<Option<Recipe>>> + Send;

    fn get_random(&self) -> impl Future<Output = CatalogResult<Option<Recipe>>> + Send;

    fn list_categories(&self) -> impl Future<Output = CatalogResult<Vec<String>>> + Send;
}

/// Collapses a failed list lookup into an empty list, logging the failure.
pub fn recipes_or_empty(operation: &str, result: CatalogResult<Vec<Recipe>>) -> Vec<Recipe> {
    result.unwrap_or_else(|error| {
        tracing::warn!(operation, %error, "catalog lookup failed");
        Vec::new()
    })
}

/// Collapses a failed single-recipe lookup into `None`, logging the failure.
pub fn recipe_or_none(operation: &str, result: CatalogResult<Option<Recipe>>) -> Option<Recipe> {
    result.unwrap_or_else(|error| {
        tracing::warn!(operation, %error, "catalog lookup failed");
        None
    })
}

#[derive(Debug, Clone)]
pub struct Client {
    base_url: String,
    http: HttpClient,
}

impl Client {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/').to_owned();
        if base_url.is_empty() {
            bail!("catalog.base_url must not be empty");
        }
        Url::parse(&base_url)
            .with_context(|| format!("catalog.base_url {base_url:?} is not a valid URL"))?;

        let http = HttpClient::builder()
            .timeout(timeout)
            .build()
            .context("build HTTP client")?;

        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str, params: &[(&str, &str)]) -> CatalogResult<Url> {
        let mut url = Url::parse(&format!("{}/{path}", self.base_url))?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        Ok(url)
    }

    async fn get_text(&self, url: Url) -> CatalogResult<(String, String)> {
        let url_text = url.to_string();
        tracing::debug!(url = %url_text, "catalog request");

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|source| CatalogError::Transport {
                url: url_text.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CatalogError::Status {
                url: url_text,
                status,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|source| CatalogError::Transport {
                url: url_text.clone(),
                source,
            })?;
        Ok((url_text, body))
    }

    async fn fetch_meals(&self, url: Url) -> CatalogResult<Vec<Recipe>> {
        let (url, body) = self.get_text(url).await?;
        parse_meals(&body).map_err(|source| CatalogError::Decode { url, source })
    }
}

impl RecipeCatalog for Client {
    async fn search_by_name(&self, query: &str) -> CatalogResult<Vec<Recipe>> {
        let url = self.endpoint("search.php", &[("s", query)])?;
        self.fetch_meals(url).await
    }

    async fn filter_by_category(&self, category: &str) -> CatalogResult<Vec<Recipe>> {
        let url = self.endpoint("filter.php", &[("c", category)])?;
        self.fetch_meals(url).await
    }

    async fn get_by_id(&self, id: &RecipeId) -> CatalogResult<Option<Recipe>> {
        let url = self.endpoint("lookup.php", &[("i", id.as_str())])?;
        Ok(self.fetch_meals(url).await?.into_iter().next())
    }

    async fn get_random(&self) -> CatalogResult<Option<Recipe>> {
        let url = self.endpoint("random.php", &[])?;
        Ok(self.fetch_meals(url).await?.into_iter().next())
    }

    async fn list_categories(&self) -> CatalogResult<Vec<String>> {
        let url = self.endpoint("list.php", &[("c", "list")])?;
        let (url, body) = self.get_text(url).await?;
        parse_categories(&body).map_err(|source| CatalogError::Decode { url, source })
    }
}

/// Decodes a `{"meals": [...]}` envelope. A `null` or non-list `meals`
/// value means no match.
pub fn parse_meals(body: &str) -> serde_json::Result<Vec<Recipe>> {
    let envelope: Envelope<RawMeal> = serde_json::from_str(body)?;
    Ok(envelope.meals.into_iter().map(RawMeal::into_recipe).collect())
}

pub fn parse_categories(body: &str) -> serde_json::Result<Vec<String>> {
    let envelope: Envelope<CategoryRow> = serde_json::from_str(body)?;
    Ok(envelope
        .meals
        .into_iter()
        .map(|row| row.category.trim().to_owned())
        .filter(|name| !name.is_empty())
        .collect())
}

#[derive(Debug, Deserialize)]
#[serde(bound = "T: DeserializeOwned")]
struct Envelope<T> {
    #[serde(default, deserialize_with = "list_or_empty")]
    meals: Vec<T>,
}

fn list_or_empty<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Array(_) => serde_json::from_value(value).map_err(serde::de::Error::custom),
        _ => Ok(Vec::new()),
    }
}

#[derive(Debug, Deserialize)]
struct CategoryRow {
    #[serde(rename = "strCategory")]
    category: String,
}

#[derive(Debug, Deserialize)]
struct RawMeal {
    #[serde(rename = "idMeal")]
    id: String,
    #[serde(rename = "strMeal", default)]
    name: Option<String>,
    #[serde(rename = "strMealThumb", default)]
    thumbnail: Option<String>,
    #[serde(rename = "strCategory", default)]
    category: Option<String>,
    #[serde(rename = "strArea", default)]
    area: Option<String>,
    #[serde(rename = "strInstructions", default)]
    instructions: Option<String>,
    #[serde(rename = "strYoutube", default)]
    youtube: Option<String>,
    #[serde(flatten)]
    extra: HashMap<String, Value>,
}

impl RawMeal {
    fn into_recipe(self) -> Recipe {
        let ingredients = (1..=INGREDIENT_SLOTS)
            .filter_map(|slot| {
                let name = self.slot_text("strIngredient", slot)?;
                let measure = self.slot_text("strMeasure", slot).unwrap_or_default();
                Some(Ingredient { name, measure })
            })
            .collect();

        Recipe {
            id: RecipeId::new(self.id),
            name: self.name.unwrap_or_default(),
            thumbnail: self.thumbnail.unwrap_or_default(),
            category: self.category.unwrap_or_default(),
            area: self.area.unwrap_or_default(),
            instructions: self.instructions.unwrap_or_default(),
            ingredients,
            video_url: self.youtube.filter(|link| !link.trim().is_empty()),
        }
    }

    fn slot_text(&self, prefix: &str, slot: usize) -> Option<String> {
        let text = self.extra.get(&format!("{prefix}{slot}"))?.as_str()?.trim();
        (!text.is_empty()).then(|| text.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::{Client, parse_categories, parse_meals};
    use anyhow::Result;
    use std::time::Duration;

    const STEW: &str = r#"{"meals":[{
        "idMeal":"52874","strMeal":"Beef and Mustard Pie","strMealThumb":"u1",
        "strCategory":"Beef","strArea":"British","strInstructions":"Preheat.",
        "strYoutube":"https://www.youtube.com/watch?v=nMyBC9staMU",
        "strIngredient1":"Beef","strMeasure1":"1kg",
        "strIngredient2":" ","strMeasure2":" ",
        "strIngredient3":"Salt","strMeasure3":null,
        "strIngredient4":null,"strMeasure4":null,
        "strIngredient5":"Pepper","strMeasure5":"pinch",
        "strSource":null,"dateModified":null
    }]}"#;

    #[test]
    fn parse_meals_skips_blank_ingredient_slots() -> Result<()> {
        let meals = parse_meals(STEW)?;
        assert_eq!(meals.len(), 1);
        let stew = &meals[0];
        assert_eq!(stew.id.as_str(), "52874");
        assert_eq!(stew.area, "British");
        let names: Vec<(&str, &str)> = stew
            .ingredients
            .iter()
            .map(|ingredient| (ingredient.name.as_str(), ingredient.measure.as_str()))
            .collect();
        assert_eq!(
            names,
            vec![("Beef", "1kg"), ("Salt", ""), ("Pepper", "pinch")]
        );
        assert!(stew.video_url.is_some());
        Ok(())
    }

    #[test]
    fn parse_meals_treats_null_and_text_as_empty() -> Result<()> {
        assert!(parse_meals(r#"{"meals":null}"#)?.is_empty());
        assert!(parse_meals(r#"{"meals":"no data found"}"#)?.is_empty());
        assert!(parse_meals("{}")?.is_empty());
        Ok(())
    }

    #[test]
    fn parse_meals_accepts_filter_rows_without_details() -> Result<()> {
        let meals = parse_meals(
            r#"{"meals":[{"strMeal":"Beef Stew","strMealThumb":"u1","idMeal":"1"}]}"#,
        )?;
        assert_eq!(meals[0].name, "Beef Stew");
        assert!(meals[0].ingredients.is_empty());
        assert!(meals[0].video_url.is_none());
        Ok(())
    }

    #[test]
    fn parse_meals_rejects_malformed_json() {
        assert!(parse_meals("<html>").is_err());
    }

    #[test]
    fn parse_categories_reads_names() -> Result<()> {
        let categories =
            parse_categories(r#"{"meals":[{"strCategory":"Beef"},{"strCategory":"Dessert"}]}"#)?;
        assert_eq!(categories, vec!["Beef", "Dessert"]);
        Ok(())
    }

    #[test]
    fn client_rejects_empty_or_invalid_base_url() {
        assert!(Client::new("", Duration::from_secs(1)).is_err());
        assert!(Client::new("///", Duration::from_secs(1)).is_err());
        let error = Client::new("not a url", Duration::from_secs(1))
            .expect_err("invalid url should fail");
        assert!(error.to_string().contains("is not a valid URL"));
    }

    #[test]
    fn endpoint_encodes_query_parameters() -> Result<()> {
        let client = Client::new("http://localhost:9/api/", Duration::from_secs(1))?;
        assert_eq!(client.base_url(), "http://localhost:9/api");
        let url = client.endpoint("search.php", &[("s", "mac & cheese")])?;
        assert_eq!(
            url.as_str(),
            "http://localhost:9/api/search.php?s=mac+%26+cheese"
        );
        Ok(())
    }
}
