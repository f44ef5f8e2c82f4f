//! Authenticated REST client core for the admin backend.
//!
//! # Overview
//! `ApiClient` issues JSON requests under a fixed base path (`/api`) and
//! stamps every one with `Authorization: Bearer <token>` read fresh from a
//! `CredentialProvider`. Resource services bind a collection prefix to the
//! client's verbs; `CustomerService` is the `/customers` specialization.
//!
//! # Design
//! - Request building and response parsing are sans-IO; hosts may execute
//!   the `HttpRequest` themselves or let a `Transport` do it.
//! - Failures are either `ApiError::Network` (no response) or
//!   `ApiError::Server` carrying the server's decoded body.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod http;
pub mod service;
pub mod transport;
pub mod types;

pub use client::ApiClient;
pub use config::ClientConfig;
pub use credentials::{CredentialProvider, CredentialStore, EnvCredentials};
pub use error::{ApiError, FieldErrors, TransportError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, RequestOptions};
pub use service::{resource, CustomerService, ResourceService};
pub use transport::{ReqwestTransport, Transport};
pub use types::{CreateCustomer, Customer, UpdateCustomer};
