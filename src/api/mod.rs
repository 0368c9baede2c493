//! API layer for HTTP request handling and data models.
//!
//! This module contains the HTTP surface, organized into:
//!
//! - **[`handlers`]**: Axum route handlers for all endpoints
//! - **[`models`]**: Request/response data structures for API communication
//!
//! # API Structure
//!
//! - **Health** (`/health`): Liveness probe
//! - **Encryption** (`/upload`): The upload-encrypt-respond pipeline
//! - **Docs** (`/docs`): OpenAPI reference
//! - **Static assets** (fallback): The embedded upload page

pub mod handlers;
pub mod models;
