mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::{KUMAR, SARAH, TestServer};

async fn create_card(
    server: &TestServer,
    who: (&str, &str),
    body: Value,
) -> Result<(i64, String)> {
    let client = reqwest::Client::new();
    let res = client
        .post(format!("{}/cashcard", server.base_url))
        .basic_auth(who.0, Some(who.1))
        .json(&body)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::CREATED);

    let location = res
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .expect("201 response must carry a Location header");
    let id: i64 = location
        .rsplit('/')
        .next()
        .and_then(|s| s.parse().ok())
        .expect("Location must end with the new id");

    Ok((id, location))
}

async fn get_card(server: &TestServer, who: (&str, &str), id: i64) -> Result<reqwest::Response> {
    let client = reqwest::Client::new();
    Ok(client
        .get(format!("{}/cashcard/{}", server.base_url, id))
        .basic_auth(who.0, Some(who.1))
        .send()
        .await?)
}

#[tokio::test]
async fn create_then_get_roundtrip_with_forced_ownership() -> Result<()> {
    let server = common::ensure_server().await?;

    // id/owner in the payload must be ignored, not honored
    let (id, location) = create_card(
        server,
        SARAH,
        json!({"amount": 123.45, "id": 424242, "owner": "kumar2"}),
    )
    .await?;
    assert_eq!(location, format!("/cashcard/{}", id));
    assert_ne!(id, 424242);

    let res = get_card(server, SARAH, id).await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.json::<Value>().await?;
    assert_eq!(body["id"].as_i64(), Some(id));
    assert_eq!(body["amount"].as_f64(), Some(123.45));
    assert_eq!(body["owner"].as_str(), Some("sarah1"));
    Ok(())
}

#[tokio::test]
async fn foreign_card_reads_as_404() -> Result<()> {
    let server = common::ensure_server().await?;
    let (id, _) = create_card(server, SARAH, json!({"amount": 55.00})).await?;

    // Another card owner gets the same 404 as a nonexistent id
    let res = get_card(server, KUMAR, id).await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = get_card(server, KUMAR, 987654321).await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn list_is_owner_scoped_and_sorted() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    // Only this test creates cards for kumar2
    for amount in [150.00, 1.00, 42.00] {
        create_card(server, KUMAR, json!({ "amount": amount })).await?;
    }

    let res = client
        .get(format!("{}/cashcard?size=100", server.base_url))
        .basic_auth(KUMAR.0, Some(KUMAR.1))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let cards = res.json::<Vec<Value>>().await?;
    assert_eq!(cards.len(), 3);
    assert!(cards.iter().all(|c| c["owner"].as_str() == Some("kumar2")));

    // Default sort: amount ascending
    let amounts: Vec<f64> = cards.iter().filter_map(|c| c["amount"].as_f64()).collect();
    assert_eq!(amounts, vec![1.00, 42.00, 150.00]);

    // Explicit descending sort reverses the order
    let res = client
        .get(format!("{}/cashcard?size=100&sort=amount,desc", server.base_url))
        .basic_auth(KUMAR.0, Some(KUMAR.1))
        .send()
        .await?;
    let cards = res.json::<Vec<Value>>().await?;
    let amounts: Vec<f64> = cards.iter().filter_map(|c| c["amount"].as_f64()).collect();
    assert_eq!(amounts, vec![150.00, 42.00, 1.00]);

    // Page size is honored
    let res = client
        .get(format!("{}/cashcard?page=0&size=1", server.base_url))
        .basic_auth(KUMAR.0, Some(KUMAR.1))
        .send()
        .await?;
    let cards = res.json::<Vec<Value>>().await?;
    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0]["amount"].as_f64(), Some(1.00));

    // Unknown sort fields are rejected, not passed through
    let res = client
        .get(format!("{}/cashcard?sort=balance", server.base_url))
        .basic_auth(KUMAR.0, Some(KUMAR.1))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn update_replaces_amount_and_nothing_else() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let (id, _) = create_card(server, SARAH, json!({"amount": 10.00})).await?;

    let res = client
        .put(format!("{}/cashcard/{}", server.base_url, id))
        .basic_auth(SARAH.0, Some(SARAH.1))
        .json(&json!({"amount": 19.99, "owner": "kumar2", "id": 1}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let body = get_card(server, SARAH, id).await?.json::<Value>().await?;
    assert_eq!(body["id"].as_i64(), Some(id));
    assert_eq!(body["amount"].as_f64(), Some(19.99));
    assert_eq!(body["owner"].as_str(), Some("sarah1"));
    Ok(())
}

#[tokio::test]
async fn update_of_foreign_or_missing_card_is_404_and_changes_nothing() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let (id, _) = create_card(server, SARAH, json!({"amount": 33.33})).await?;

    let res = client
        .put(format!("{}/cashcard/{}", server.base_url, id))
        .basic_auth(KUMAR.0, Some(KUMAR.1))
        .json(&json!({"amount": 0.01}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // No upsert for ids that do not exist
    let res = client
        .put(format!("{}/cashcard/987654321", server.base_url))
        .basic_auth(SARAH.0, Some(SARAH.1))
        .json(&json!({"amount": 0.01}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let body = get_card(server, SARAH, id).await?.json::<Value>().await?;
    assert_eq!(body["amount"].as_f64(), Some(33.33));
    Ok(())
}

#[tokio::test]
async fn delete_lifecycle_respects_ownership() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();
    let (id, _) = create_card(server, SARAH, json!({"amount": 77.00})).await?;

    // A foreign delete is a 404 and leaves the card in place
    let res = client
        .delete(format!("{}/cashcard/{}", server.base_url, id))
        .basic_auth(KUMAR.0, Some(KUMAR.1))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(get_card(server, SARAH, id).await?.status(), StatusCode::OK);

    let res = client
        .delete(format!("{}/cashcard/{}", server.base_url, id))
        .basic_auth(SARAH.0, Some(SARAH.1))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert_eq!(get_card(server, SARAH, id).await?.status(), StatusCode::NOT_FOUND);

    // Deleting an already-deleted card is the same 404
    let res = client
        .delete(format!("{}/cashcard/{}", server.base_url, id))
        .basic_auth(SARAH.0, Some(SARAH.1))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn malformed_write_payloads_get_400() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    // Missing amount
    let res = client
        .post(format!("{}/cashcard", server.base_url))
        .basic_auth(SARAH.0, Some(SARAH.1))
        .json(&json!({}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body = res.json::<Value>().await?;
    assert_eq!(body["code"].as_str(), Some("BAD_REQUEST"));

    // Non-numeric amount on update
    let (id, _) = create_card(server, SARAH, json!({"amount": 1.00})).await?;
    let res = client
        .put(format!("{}/cashcard/{}", server.base_url, id))
        .basic_auth(SARAH.0, Some(SARAH.1))
        .json(&json!({"amount": "not-a-number"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // The card is untouched
    let body = get_card(server, SARAH, id).await?.json::<Value>().await?;
    assert_eq!(body["amount"].as_f64(), Some(1.00));
    Ok(())
}

#[tokio::test]
async fn absurd_page_numbers_yield_an_empty_page() -> Result<()> {
    let server = common::ensure_server().await?;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/cashcard?page={}&size=100", server.base_url, i64::MAX))
        .basic_auth(SARAH.0, Some(SARAH.1))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let cards = res.json::<Vec<Value>>().await?;
    assert!(cards.is_empty());
    Ok(())
}

#[tokio::test]
async fn negative_amounts_are_accepted() -> Result<()> {
    let server = common::ensure_server().await?;
    let (id, _) = create_card(server, SARAH, json!({"amount": -12.50})).await?;

    let body = get_card(server, SARAH, id).await?.json::<Value>().await?;
    assert_eq!(body["amount"].as_f64(), Some(-12.50));
    Ok(())
}
