use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(rename = "type")]
    pub customer_type: String,
    pub gender: String,
    pub balance: f64,
    pub phone: Option<String>,
    pub status: Option<String>,
    pub account_number: Option<String>,
    pub address: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomer {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(rename = "type", default)]
    pub customer_type: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub balance: f64,
    pub phone: Option<String>,
    pub status: Option<String>,
    pub account_number: Option<String>,
    pub address: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCustomer {
    pub name: Option<String>,
    pub email: Option<String>,
    #[serde(rename = "type")]
    pub customer_type: Option<String>,
    pub gender: Option<String>,
    pub balance: Option<f64>,
    pub phone: Option<String>,
    pub status: Option<String>,
    pub account_number: Option<String>,
    pub address: Option<String>,
}

pub type Db = Arc<RwLock<HashMap<String, Customer>>>;

#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub token: Arc<str>,
}

pub fn app(token: &str) -> Router {
    app_with(token, Vec::new())
}

/// Router over a store pre-filled with `customers`.
pub fn app_with(token: &str, customers: Vec<Customer>) -> Router {
    let db: Db = Arc::new(RwLock::new(
        customers.into_iter().map(|c| (c.id.clone(), c)).collect(),
    ));
    let state = AppState {
        db,
        token: Arc::from(token),
    };
    let customers = Router::new()
        .route("/customers", get(list_customers).post(create_customer))
        .route(
            "/customers/{id}",
            get(get_customer).put(update_customer).delete(delete_customer),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_bearer))
        .with_state(state);
    Router::new().nest("/api", customers)
}

pub async fn run(listener: TcpListener, token: &str) -> Result<(), std::io::Error> {
    axum::serve(listener, app(token)).await
}

fn message(status: StatusCode, text: &str) -> Response {
    (status, Json(json!({ "message": text }))).into_response()
}

async fn require_bearer(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let expected = format!("Bearer {}", state.token);
    let authorized = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == expected);
    if !authorized {
        tracing::info!(uri = %request.uri(), "rejecting unauthenticated request");
        return message(StatusCode::UNAUTHORIZED, "unauthorized");
    }
    next.run(request).await
}

/// Field messages for every rule `customer` breaks, or `None` when valid.
pub fn validate(customer: &Customer) -> Option<Value> {
    let mut errors: HashMap<&str, Vec<&str>> = HashMap::new();
    if customer.name.trim().is_empty() {
        errors.entry("name").or_default().push("required");
    }
    if customer.email.trim().is_empty() {
        errors.entry("email").or_default().push("required");
    } else if !customer.email.contains('@') {
        errors.entry("email").or_default().push("email");
    }
    if customer.customer_type.trim().is_empty() {
        errors.entry("type").or_default().push("required");
    }
    if customer.gender.trim().is_empty() {
        errors.entry("gender").or_default().push("required");
    }
    if customer.balance < 0.0 {
        errors.entry("balance").or_default().push("minValue");
    }
    if errors.is_empty() {
        None
    } else {
        Some(json!({ "errors": errors }))
    }
}

fn unprocessable(errors: Value) -> Response {
    (StatusCode::UNPROCESSABLE_ENTITY, Json(errors)).into_response()
}

async fn list_customers(State(state): State<AppState>) -> Json<Vec<Customer>> {
    let customers = state.db.read().await;
    let mut all: Vec<Customer> = customers.values().cloned().collect();
    all.sort_by(|a, b| a.id.cmp(&b.id));
    Json(all)
}

async fn create_customer(
    State(state): State<AppState>,
    Json(input): Json<CreateCustomer>,
) -> Response {
    let customer = Customer {
        id: Uuid::new_v4().to_string(),
        name: input.name,
        email: input.email,
        customer_type: input.customer_type,
        gender: input.gender,
        balance: input.balance,
        phone: input.phone,
        status: input.status,
        account_number: input.account_number,
        address: input.address,
    };
    if let Some(errors) = validate(&customer) {
        return unprocessable(errors);
    }
    tracing::info!(id = %customer.id, "created customer");
    state
        .db
        .write()
        .await
        .insert(customer.id.clone(), customer.clone());
    (StatusCode::CREATED, Json(customer)).into_response()
}

async fn get_customer(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let customers = state.db.read().await;
    match customers.get(&id) {
        Some(customer) => Json(customer.clone()).into_response(),
        None => message(StatusCode::NOT_FOUND, "customer not found"),
    }
}

async fn update_customer(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdateCustomer>,
) -> Response {
    let mut customers = state.db.write().await;
    let Some(stored) = customers.get_mut(&id) else {
        return message(StatusCode::NOT_FOUND, "customer not found");
    };

    let mut customer = stored.clone();
    if let Some(name) = input.name {
        customer.name = name;
    }
    if let Some(email) = input.email {
        customer.email = email;
    }
    if let Some(customer_type) = input.customer_type {
        customer.customer_type = customer_type;
    }
    if let Some(gender) = input.gender {
        customer.gender = gender;
    }
    if let Some(balance) = input.balance {
        customer.balance = balance;
    }
    if input.phone.is_some() {
        customer.phone = input.phone;
    }
    if input.status.is_some() {
        customer.status = input.status;
    }
    if input.account_number.is_some() {
        customer.account_number = input.account_number;
    }
    if input.address.is_some() {
        customer.address = input.address;
    }

    if let Some(errors) = validate(&customer) {
        return unprocessable(errors);
    }
    tracing::info!(%id, "updated customer");
    *stored = customer.clone();
    Json(customer).into_response()
}

async fn delete_customer(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let mut customers = state.db.write().await;
    match customers.remove(&id) {
        Some(_) => {
            tracing::info!(%id, "deleted customer");
            StatusCode::NO_CONTENT.into_response()
        }
        None => message(StatusCode::NOT_FOUND, "customer not found"),
    }
}
