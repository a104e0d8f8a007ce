use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::AppResult;
use super::{AppState, AuthUser};
use crate::db::PantryRepository;
use crate::models::PantryItem;
use crate::units::{convert as convert_units, Unit};
use crate::Error;

#[derive(Debug, Deserialize)]
pub struct ItemInput {
    pub name: String,
    pub quantity: f64,
    #[serde(default)]
    pub unit: String,
}

pub async fn list(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
) -> AppResult<Json<Vec<PantryItem>>> {
    let items = PantryRepository::new(state.pool.clone()).list(user.id).await?;
    Ok(Json(items))
}

/// Adds stock, merging into a matching item when the units allow it.
pub async fn add(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Json(input): Json<ItemInput>,
) -> AppResult<(StatusCode, Json<PantryItem>)> {
    let item = PantryRepository::new(state.pool.clone())
        .add(user.id, &input.name, input.quantity, &input.unit)
        .await?;
    Ok((StatusCode::CREATED, Json(item)))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(input): Json<ItemInput>,
) -> AppResult<Json<PantryItem>> {
    let item = PantryRepository::new(state.pool.clone())
        .update(user.id, id, &input.name, input.quantity, &input.unit)
        .await?
        .ok_or_else(|| Error::not_found("Pantry item"))?;
    Ok(Json(item))
}

pub async fn remove(
    State(state): State<AppState>,
    Extension(AuthUser(user)): Extension<AuthUser>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    if PantryRepository::new(state.pool.clone())
        .delete(user.id, id)
        .await?
    {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::not_found("Pantry item").into())
    }
}

#[derive(Debug, Deserialize)]
pub struct ConvertQuery {
    pub amount: f64,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Serialize)]
pub struct ConvertResponse {
    pub amount: f64,
    pub from: String,
    pub to: String,
    pub result: f64,
}

pub async fn convert(Query(query): Query<ConvertQuery>) -> AppResult<Json<ConvertResponse>> {
    let from = Unit::parse(&query.from);
    let to = Unit::parse(&query.to);
    let result = convert_units(query.amount, &from, &to)?;
    Ok(Json(ConvertResponse {
        amount: query.amount,
        from: from.to_string(),
        to: to.to_string(),
        result,
    }))
}

#[cfg(test)]
mod tests {
    use crate::llm::testing::MockProvider;
    use crate::server::testing::test_app;
    use axum::http::StatusCode;
    use serde_json::json;

    #[tokio::test]
    async fn test_inventory_crud() {
        let app = test_app(MockProvider::default()).await;

        let (status, created) = app
            .call(
                "POST",
                "/api/inventory",
                Some(json!({"name": "flour", "quantity": 1, "unit": "kg"})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["id"].as_str().unwrap().to_string();

        // merges into the same row
        let (_, merged) = app
            .call(
                "POST",
                "/api/inventory",
                Some(json!({"name": "Flour", "quantity": 250, "unit": "g"})),
            )
            .await;
        assert_eq!(merged["id"], id.as_str());
        assert_eq!(merged["quantity"], 1.25);

        let (status, updated) = app
            .call(
                "PUT",
                &format!("/api/inventory/{}", id),
                Some(json!({"name": "bread flour", "quantity": 2, "unit": "kg"})),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["name"], "bread flour");

        let (_, list) = app.call("GET", "/api/inventory", None).await;
        assert_eq!(list.as_array().unwrap().len(), 1);

        let (status, _) = app
            .call("DELETE", &format!("/api/inventory/{}", id), None)
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = app
            .call("DELETE", &format!("/api/inventory/{}", id), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_items_are_private() {
        let app = test_app(MockProvider::default()).await;
        let (_, created) = app
            .call(
                "POST",
                "/api/inventory",
                Some(json!({"name": "eggs", "quantity": 6})),
            )
            .await;
        let id = created["id"].as_str().unwrap();

        let (_, token) = app.other_user("other@example.com", "Other").await;
        let (status, _) = crate::server::testing::send(
            &app.router,
            "DELETE",
            &format!("/api/inventory/{}", id),
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_negative_quantity_rejected() {
        let app = test_app(MockProvider::default()).await;
        let (status, body) = app
            .call(
                "POST",
                "/api/inventory",
                Some(json!({"name": "salt", "quantity": -1, "unit": "g"})),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation_error");
    }

    #[tokio::test]
    async fn test_convert() {
        let app = test_app(MockProvider::default()).await;
        let (status, body) = app
            .call("GET", "/api/convert?amount=1&from=cup&to=ml", None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert!((body["result"].as_f64().unwrap() - 236.588).abs() < 1e-6);

        let (status, body) = app
            .call("GET", "/api/convert?amount=1&from=cup&to=piece", None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().contains("not comparable"));
    }
}
