//! Clients: the people and companies a tenant sells to.
//!
//! Pure resource definition (model, inputs, list options, column map). No IO;
//! storage adapters work against the [`jarvis_query::Resource`] impl.

pub mod client;

pub use client::{Client, ClientFilter, ClientPatch, ClientSummary, ClientType, NewClient};
