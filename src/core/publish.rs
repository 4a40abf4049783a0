//! Layer publication to the map server
//!
//! Workspaces and datastores are created when missing. Each catalog layer is
//! then created, or updated when it already exists. A failed layer is logged
//! and skipped; the remaining layers are still published.

use crate::adapters::database::ExtentSource;
use crate::adapters::geoserver::{
    BoundingBox, DataStoreBody, DataStorePayload, FeatureType, FeatureTypeAction,
    FeatureTypePayload, GeoServerClient, PostGisParameters,
};
use crate::adapters::postgresql::ConnectionParameters;
use crate::config::{DatabaseConfig, GeoServerConfig};
use crate::domain::{LayerCatalogEntry, Result};
use async_trait::async_trait;
use secrecy::ExposeSecret;
use std::sync::Arc;
use std::time::Duration;

/// CRS of the advertised geographic bounding box
const LAT_LON_CRS: &str = "EPSG:4326";

/// Publishes a layer catalog
#[async_trait]
pub trait LayerPublisher: Send + Sync {
    /// Publish every layer of the catalog
    ///
    /// # Errors
    ///
    /// Returns an error when publication cannot proceed at all (workspace or
    /// datastore setup, extent queries). Individual layer failures are
    /// reported in the [`PublishReport`] instead.
    async fn publish(&self, catalog: &[LayerCatalogEntry]) -> Result<PublishReport>;
}

/// A layer that could not be published
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerFailure {
    pub layer: String,
    pub message: String,
}

/// Outcome of one publication pass
#[derive(Debug, Clone, Default)]
pub struct PublishReport {
    /// Layers created
    pub created: Vec<String>,

    /// Layers that already existed and were updated
    pub updated: Vec<String>,

    /// Layers skipped after an error
    pub failed: Vec<LayerFailure>,

    /// Time spent publishing
    pub duration: Duration,
}

impl PublishReport {
    /// Number of layers published (created or updated)
    pub fn published(&self) -> usize {
        self.created.len() + self.updated.len()
    }

    /// Whether every layer was published
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// Log the report
    pub fn log_summary(&self) {
        tracing::info!(
            created = self.created.len(),
            updated = self.updated.len(),
            failed = self.failed.len(),
            duration_secs = self.duration.as_secs(),
            "Publication finished"
        );
        for failure in &self.failed {
            tracing::warn!(layer = %failure.layer, message = %failure.message, "Layer not published");
        }
    }
}

/// [`LayerPublisher`] backed by the GeoServer REST API
pub struct GeoServerPublisher {
    client: GeoServerClient,
    extents: Arc<dyn ExtentSource + Send + Sync>,
    config: GeoServerConfig,
    datastore_parameters: PostGisParameters,
}

impl GeoServerPublisher {
    /// Create a publisher
    ///
    /// The datastore connection parameters derive from the database
    /// configuration; `geoserver.datastore_host` replaces the host when the
    /// map server reaches the database under another name.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or the database
    /// connection string cannot be parsed.
    pub fn new(
        config: &GeoServerConfig,
        database: &DatabaseConfig,
        extents: Arc<dyn ExtentSource + Send + Sync>,
    ) -> Result<Self> {
        let client = GeoServerClient::new(config)?;
        let params = ConnectionParameters::from_config(database)?;

        let datastore_parameters = PostGisParameters {
            host: config.datastore_host.clone().unwrap_or(params.host),
            port: params.port.to_string(),
            database: params.dbname,
            user: params.user,
            passwd: params
                .password
                .as_ref()
                .map(|p| p.expose_secret().as_ref().to_string())
                .unwrap_or_default(),
            dbtype: "postgis".to_string(),
            schema: config.datastore_schema.clone(),
        };

        Ok(Self {
            client,
            extents,
            config: config.clone(),
            datastore_parameters,
        })
    }

    fn datastore_payload(&self) -> DataStorePayload {
        DataStorePayload {
            data_store: DataStoreBody {
                name: self.config.datastore.clone(),
                connection_parameters: self.datastore_parameters.clone(),
            },
        }
    }

    async fn feature_type_payload(&self, layer: &LayerCatalogEntry) -> Result<FeatureTypePayload> {
        let (schema, table) = layer.schema_and_table();
        let extent = self.extents.extent(schema, table).await?;
        let bbox = &self.config.lat_lon_bbox;

        Ok(FeatureTypePayload {
            feature_type: FeatureType {
                name: layer.wms_name.clone(),
                native_name: layer.native_table.clone(),
                title: layer.display_title(),
                srs: self.config.srs.clone(),
                native_crs: self.config.srs.clone(),
                projection_policy: "REPROJECT_TO_DECLARED".to_string(),
                enabled: true,
                native_bounding_box: BoundingBox::from_extent(extent, &self.config.srs),
                lat_lon_bounding_box: BoundingBox {
                    minx: bbox.minx,
                    maxx: bbox.maxx,
                    miny: bbox.miny,
                    maxy: bbox.maxy,
                    crs: LAT_LON_CRS.to_string(),
                },
            },
        })
    }

    fn workspace_of<'a>(&'a self, layer: &'a LayerCatalogEntry) -> &'a str {
        if layer.workspace.is_empty() {
            &self.config.workspace
        } else {
            &layer.workspace
        }
    }
}

#[async_trait]
impl LayerPublisher for GeoServerPublisher {
    async fn publish(&self, catalog: &[LayerCatalogEntry]) -> Result<PublishReport> {
        let started = std::time::Instant::now();
        let mut report = PublishReport::default();

        let mut workspaces: Vec<&str> = Vec::new();
        for layer in catalog {
            let workspace = self.workspace_of(layer);
            if !workspaces.contains(&workspace) {
                workspaces.push(workspace);
            }
        }

        let datastore = self.datastore_payload();
        for workspace in &workspaces {
            self.client.ensure_workspace(workspace).await?;
            self.client.ensure_datastore(workspace, &datastore).await?;
        }

        for layer in catalog {
            let workspace = self.workspace_of(layer);
            let payload = self.feature_type_payload(layer).await?;

            match self
                .client
                .publish_feature_type(workspace, &self.config.datastore, &payload)
                .await
            {
                Ok(FeatureTypeAction::Created) => {
                    tracing::info!(layer = %layer.wms_name, workspace = %workspace, "Published layer");
                    report.created.push(layer.wms_name.clone());
                }
                Ok(FeatureTypeAction::Updated) => {
                    tracing::info!(layer = %layer.wms_name, workspace = %workspace, "Updated layer");
                    report.updated.push(layer.wms_name.clone());
                }
                Err(e) => {
                    tracing::error!(layer = %layer.id, error = %e, "Publishing layer failed");
                    report.failed.push(LayerFailure {
                        layer: layer.id.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }

        report.duration = started.elapsed();
        Ok(report)
    }
}
