//! GeoServer REST client
//!
//! Covers the handful of catalog calls publication needs: workspace and
//! datastore lookups, their creation, and feature type create-or-update.
//! Every request carries HTTP Basic credentials.

use super::models::{
    DataStorePayload, FeatureTypeAction, FeatureTypePayload, WorkspacePayload,
};
use crate::config::GeoServerConfig;
use crate::domain::{IngestError, Result};
use base64::{engine::general_purpose, Engine as _};
use reqwest::{Client, ClientBuilder, RequestBuilder, StatusCode};
use secrecy::ExposeSecret;
use std::time::Duration;

/// Authenticated client for the GeoServer REST API
pub struct GeoServerClient {
    /// Base URL without trailing slash
    base_url: String,

    /// HTTP client for making requests
    client: Client,

    /// Precomputed `Authorization` header value
    auth_header: String,
}

impl GeoServerClient {
    /// Create a client for the configured server
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &GeoServerConfig) -> Result<Self> {
        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| IngestError::Http(format!("Failed to build HTTP client: {}", e)))?;

        let credentials = format!(
            "{}:{}",
            config.username,
            config.password.expose_secret().as_ref()
        );
        let encoded = general_purpose::STANDARD.encode(credentials.as_bytes());

        Ok(Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            client,
            auth_header: format!("Basic {encoded}"),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/rest/{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("Authorization", &self.auth_header)
            .header("Accept", "application/json")
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        let response = self
            .authorized(self.client.get(self.url(path)))
            .send()
            .await?;
        Ok(response.status() == StatusCode::OK)
    }

    async fn post_expecting_success<T: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
        what: &str,
    ) -> Result<()> {
        let response = self
            .authorized(self.client.post(self.url(path)))
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(IngestError::Publication(format!(
                "Creating {what} failed with status {status}: {body}"
            )));
        }
        Ok(())
    }

    /// Whether the workspace exists
    pub async fn workspace_exists(&self, workspace: &str) -> Result<bool> {
        self.exists(&format!("workspaces/{workspace}.json")).await
    }

    /// Create the workspace if the lookup does not find it
    ///
    /// # Errors
    ///
    /// Returns an error if the server is unreachable or refuses the creation.
    pub async fn ensure_workspace(&self, workspace: &str) -> Result<()> {
        if self.workspace_exists(workspace).await? {
            return Ok(());
        }

        tracing::info!(workspace = %workspace, "Creating GeoServer workspace");
        self.post_expecting_success(
            "workspaces",
            &WorkspacePayload::new(workspace),
            &format!("workspace {workspace}"),
        )
        .await
    }

    /// Whether the datastore exists in the workspace
    pub async fn datastore_exists(&self, workspace: &str, datastore: &str) -> Result<bool> {
        self.exists(&format!("workspaces/{workspace}/datastores/{datastore}.json"))
            .await
    }

    /// Create the datastore if the lookup does not find it
    ///
    /// # Errors
    ///
    /// Returns an error if the server is unreachable or refuses the creation.
    pub async fn ensure_datastore(&self, workspace: &str, payload: &DataStorePayload) -> Result<()> {
        let datastore = &payload.data_store.name;
        if self.datastore_exists(workspace, datastore).await? {
            return Ok(());
        }

        tracing::info!(workspace = %workspace, datastore = %datastore, "Creating GeoServer datastore");
        self.post_expecting_success(
            &format!("workspaces/{workspace}/datastores"),
            payload,
            &format!("datastore {datastore}"),
        )
        .await
    }

    /// Create a feature type, or update it when it already exists
    ///
    /// # Errors
    ///
    /// Returns an error on transport failures and on any status other than
    /// 201 for the creation, or a non-success status for the update.
    pub async fn publish_feature_type(
        &self,
        workspace: &str,
        datastore: &str,
        payload: &FeatureTypePayload,
    ) -> Result<FeatureTypeAction> {
        let collection = format!("workspaces/{workspace}/datastores/{datastore}/featuretypes");
        let name = &payload.feature_type.name;

        let response = self
            .authorized(self.client.post(self.url(&collection)))
            .json(payload)
            .send()
            .await?;

        match response.status() {
            StatusCode::CREATED => Ok(FeatureTypeAction::Created),
            StatusCode::CONFLICT => {
                let response = self
                    .authorized(self.client.put(self.url(&format!("{collection}/{name}"))))
                    .json(payload)
                    .send()
                    .await?;

                if !response.status().is_success() {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    return Err(IngestError::Http(format!(
                        "Updating layer {name} failed with status {status}: {body}"
                    )));
                }
                Ok(FeatureTypeAction::Updated)
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(IngestError::Http(format!(
                    "Creating layer {name} failed with status {status}: {body}"
                )))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::secret_string;

    #[test]
    fn test_basic_auth_header() {
        let config = GeoServerConfig {
            url: "http://geoserver:8080/geoserver/".to_string(),
            username: "admin".to_string(),
            password: secret_string("geoserver".to_string()),
            ..GeoServerConfig::default()
        };
        let client = GeoServerClient::new(&config).unwrap();

        assert_eq!(client.auth_header, "Basic YWRtaW46Z2Vvc2VydmVy");
        assert_eq!(
            client.url("workspaces"),
            "http://geoserver:8080/geoserver/rest/workspaces"
        );
    }
}
