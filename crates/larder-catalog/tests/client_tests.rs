// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow};
use larder_app::RecipeId;
use larder_catalog::{CatalogError, Client, RecipeCatalog, recipe_or_none, recipes_or_empty};
use std::thread;
use std::time::Duration;
use tiny_http::{Header, Response, Server};

fn json_response(body: &str, status: u16) -> Response<std::io::Cursor<Vec<u8>>> {
    Response::from_string(body)
        .with_status_code(status)
        .with_header(
            Header::from_bytes("Content-Type", "application/json")
                .expect("valid content type header"),
        )
}

fn serve(routes: Vec<(&'static str, u16, &'static str)>) -> Result<(String, thread::JoinHandle<()>)> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}/api/json/v1/1", server.server_addr());

    let handle = thread::spawn(move || {
        for (expected_url, status, body) in routes {
            let request = server.recv().expect("request expected");
            assert_eq!(request.url(), expected_url);
            request
                .respond(json_response(body, status))
                .expect("response should succeed");
        }
    });
    Ok((addr, handle))
}

#[tokio::test]
async fn search_and_lookup_decode_against_mock_server() -> Result<()> {
    let (addr, handle) = serve(vec![
        (
            "/api/json/v1/1/search.php?s=beef+stew",
            200,
            r#"{"meals":[{"idMeal":"52874","strMeal":"Beef Stew","strMealThumb":"u1","strIngredient1":"Beef","strMeasure1":"1kg"}]}"#,
        ),
        (
            "/api/json/v1/1/lookup.php?i=52874",
            200,
            r#"{"meals":[{"idMeal":"52874","strMeal":"Beef Stew","strMealThumb":"u1","strCategory":"Beef","strArea":"British"}]}"#,
        ),
    ])?;

    let client = Client::new(&addr, Duration::from_secs(2))?;
    let results = client.search_by_name("beef stew").await?;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].name, "Beef Stew");
    assert_eq!(results[0].ingredients[0].measure, "1kg");

    let recipe = client
        .get_by_id(&RecipeId::from("52874"))
        .await?
        .expect("lookup should find the recipe");
    assert_eq!(recipe.category, "Beef");

    handle.join().expect("server thread should join");
    Ok(())
}

#[tokio::test]
async fn null_meals_are_not_found_rather_than_errors() -> Result<()> {
    let (addr, handle) = serve(vec![
        ("/api/json/v1/1/filter.php?c=Nothing", 200, r#"{"meals":null}"#),
        ("/api/json/v1/1/random.php", 200, r#"{"meals":null}"#),
    ])?;

    let client = Client::new(&addr, Duration::from_secs(2))?;
    assert!(client.filter_by_category("Nothing").await?.is_empty());
    assert!(client.get_random().await?.is_none());

    handle.join().expect("server thread should join");
    Ok(())
}

#[tokio::test]
async fn server_errors_and_bad_bodies_surface_as_catalog_errors() -> Result<()> {
    let (addr, handle) = serve(vec![
        ("/api/json/v1/1/search.php?s=pie", 503, "unavailable"),
        ("/api/json/v1/1/search.php?s=pie", 200, "<html>oops</html>"),
    ])?;

    let client = Client::new(&addr, Duration::from_secs(2))?;
    let status = client.search_by_name("pie").await;
    assert!(matches!(status, Err(CatalogError::Status { .. })));

    let decode = client.search_by_name("pie").await;
    assert!(matches!(decode, Err(CatalogError::Decode { .. })));
    assert!(recipes_or_empty("search", decode).is_empty());

    handle.join().expect("server thread should join");
    Ok(())
}

#[tokio::test]
async fn unreachable_catalog_collapses_to_absent() -> Result<()> {
    let client = Client::new("http://127.0.0.1:1/api", Duration::from_millis(200))?;

    let result = client.get_random().await;
    let error = result.as_ref().expect_err("unreachable endpoint should fail");
    assert!(error.to_string().contains("cannot reach recipe catalog"));
    assert!(recipe_or_none("random", result).is_none());
    Ok(())
}

#[tokio::test]
async fn list_categories_reads_category_names() -> Result<()> {
    let (addr, handle) = serve(vec![(
        "/api/json/v1/1/list.php?c=list",
        200,
        r#"{"meals":[{"strCategory":"Beef"},{"strCategory":"Chicken"},{"strCategory":"Dessert"}]}"#,
    )])?;

    let client = Client::new(&addr, Duration::from_secs(2))?;
    assert_eq!(
        client.list_categories().await?,
        vec!["Beef", "Chicken", "Dessert"]
    );

    handle.join().expect("server thread should join");
    Ok(())
}
