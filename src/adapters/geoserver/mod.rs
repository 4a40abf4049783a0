//! GeoServer map server integration
//!
//! This module provides the REST client and payload models used by the
//! publication step.

pub mod client;
pub mod models;

pub use client::GeoServerClient;
pub use models::{
    BoundingBox, DataStoreBody, DataStorePayload, FeatureType, FeatureTypeAction,
    FeatureTypePayload, PostGisParameters, WorkspacePayload,
};
