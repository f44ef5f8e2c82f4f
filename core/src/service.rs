//! Resource services: prefix-bound views of `ApiClient`.
//!
//! # Design
//! `resource(client, prefix)` returns a `ResourceService` whose verbs prepend
//! the prefix and otherwise delegate unchanged. Entity services such as
//! `CustomerService` hold one and add typed operations on top; they add no
//! validation or payload transformation of their own.

use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Serialize;

use crate::client::ApiClient;
use crate::error::ApiError;
use crate::http::RequestOptions;
use crate::types::{CreateCustomer, Customer, UpdateCustomer};

/// Verb helpers bound to one resource collection.
#[derive(Debug, Clone)]
pub struct ResourceService {
    client: ApiClient,
    prefix: String,
}

/// Bind `client` to the collection at `prefix` (e.g. `/customers`).
pub fn resource(client: ApiClient, prefix: impl Into<String>) -> ResourceService {
    ResourceService {
        client,
        prefix: prefix.into(),
    }
}

impl ResourceService {
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    fn path(&self, path: &str) -> String {
        format!("{}{path}", self.prefix)
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        options: &RequestOptions,
    ) -> Result<T, ApiError> {
        self.client.get(&self.path(path), options).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        options: &RequestOptions,
    ) -> Result<T, ApiError> {
        self.client.post(&self.path(path), body, options).await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        options: &RequestOptions,
    ) -> Result<T, ApiError> {
        self.client.put(&self.path(path), body, options).await
    }

    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
        options: &RequestOptions,
    ) -> Result<T, ApiError> {
        self.client.delete(&self.path(path), options).await
    }
}

pub const CUSTOMERS_PREFIX: &str = "/customers";

/// CRUD operations on `/customers`.
#[derive(Debug, Clone)]
pub struct CustomerService {
    resource: ResourceService,
}

impl CustomerService {
    pub fn new(client: ApiClient) -> Self {
        Self {
            resource: resource(client, CUSTOMERS_PREFIX),
        }
    }

    pub async fn list(&self) -> Result<Vec<Customer>, ApiError> {
        self.resource.get("", &RequestOptions::new()).await
    }

    pub async fn get_one(&self, id: &str) -> Result<Customer, ApiError> {
        self.resource.get(&format!("/{id}"), &RequestOptions::new()).await
    }

    pub async fn create(&self, input: &CreateCustomer) -> Result<Customer, ApiError> {
        self.resource.post("", input, &RequestOptions::new()).await
    }

    pub async fn update(&self, id: &str, input: &UpdateCustomer) -> Result<Customer, ApiError> {
        self.resource
            .put(&format!("/{id}"), input, &RequestOptions::new())
            .await
    }

    /// Any 2xx counts as deleted; a returned body is discarded.
    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.resource
            .delete::<IgnoredAny>(&format!("/{id}"), &RequestOptions::new())
            .await
            .map(|_| ())
    }
}
