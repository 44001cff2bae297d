//! HTTP command bridge for driving a live scene editor from LLM- or
//! operator-generated JSON commands.
//!
//! Commands arrive concurrently over `POST /executeCommand/`, are validated
//! against a declarative schema registry, and are applied one at a time on a
//! dedicated apply thread that owns the scene. See [`bridge::ApplyBridge`]
//! for the serialization contract and [`handlers::build_registry`] for the
//! built-in command set.

pub mod api;
pub mod batch;
pub mod bridge;
pub mod convert;
pub mod dispatch;
pub mod envelope;
pub mod error;
pub mod handlers;
pub mod registry;
pub mod scene;
pub mod validate;
