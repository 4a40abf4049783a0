//! GeoServer REST payloads

use crate::domain::Extent;
use serde::{Deserialize, Serialize};

/// `POST /rest/workspaces` body
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkspacePayload {
    pub workspace: WorkspaceBody,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkspaceBody {
    pub name: String,
}

impl WorkspacePayload {
    pub fn new(name: &str) -> Self {
        Self {
            workspace: WorkspaceBody {
                name: name.to_string(),
            },
        }
    }
}

/// `POST /rest/workspaces/{ws}/datastores` body
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataStorePayload {
    #[serde(rename = "dataStore")]
    pub data_store: DataStoreBody,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataStoreBody {
    pub name: String,

    #[serde(rename = "connectionParameters")]
    pub connection_parameters: PostGisParameters,
}

/// PostGIS datastore connection parameters
///
/// Serialized with the key names GeoServer expects (`passwd`, `dbtype`).
#[derive(Clone, Serialize, Deserialize, PartialEq)]
pub struct PostGisParameters {
    pub host: String,
    pub port: String,
    pub database: String,
    pub user: String,
    pub passwd: String,
    pub dbtype: String,
    pub schema: String,
}

impl std::fmt::Debug for PostGisParameters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostGisParameters")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("passwd", &"***")
            .field("schema", &self.schema)
            .finish()
    }
}

/// Feature type create/update body
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureTypePayload {
    #[serde(rename = "featureType")]
    pub feature_type: FeatureType,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeatureType {
    pub name: String,
    pub native_name: String,
    pub title: String,
    pub srs: String,
    #[serde(rename = "nativeCRS")]
    pub native_crs: String,
    pub projection_policy: String,
    pub enabled: bool,
    pub native_bounding_box: BoundingBox,
    pub lat_lon_bounding_box: BoundingBox,
}

/// Bounding box with its CRS
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BoundingBox {
    pub minx: f64,
    pub maxx: f64,
    pub miny: f64,
    pub maxy: f64,
    pub crs: String,
}

impl BoundingBox {
    pub fn from_extent(extent: Extent, crs: &str) -> Self {
        Self {
            minx: extent.minx,
            maxx: extent.maxx,
            miny: extent.miny,
            maxy: extent.maxy,
            crs: crs.to_string(),
        }
    }
}

/// Outcome of publishing one feature type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureTypeAction {
    Created,
    Updated,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_type_serialization() {
        let payload = FeatureTypePayload {
            feature_type: FeatureType {
                name: "cadastral_parcels".to_string(),
                native_name: "gs.v_cadastral_parcels".to_string(),
                title: "Cadastral Parcels".to_string(),
                srs: "EPSG:3765".to_string(),
                native_crs: "EPSG:3765".to_string(),
                projection_policy: "REPROJECT_TO_DECLARED".to_string(),
                enabled: true,
                native_bounding_box: BoundingBox::from_extent(Extent::default(), "EPSG:3765"),
                lat_lon_bounding_box: BoundingBox {
                    minx: 13.0,
                    maxx: 20.0,
                    miny: 42.0,
                    maxy: 47.0,
                    crs: "EPSG:4326".to_string(),
                },
            },
        };

        let json = serde_json::to_value(&payload).unwrap();
        let feature_type = &json["featureType"];
        assert_eq!(feature_type["nativeName"], "gs.v_cadastral_parcels");
        assert_eq!(feature_type["nativeCRS"], "EPSG:3765");
        assert_eq!(feature_type["projectionPolicy"], "REPROJECT_TO_DECLARED");
        assert_eq!(feature_type["latLonBoundingBox"]["crs"], "EPSG:4326");
        assert_eq!(feature_type["nativeBoundingBox"]["minx"], 0.0);
    }

    #[test]
    fn test_datastore_debug_redacts_password() {
        let params = PostGisParameters {
            host: "db".to_string(),
            port: "5432".to_string(),
            database: "gis".to_string(),
            user: "gs".to_string(),
            passwd: "hunter2".to_string(),
            dbtype: "postgis".to_string(),
            schema: "public".to_string(),
        };
        assert!(!format!("{params:?}").contains("hunter2"));

        let json = serde_json::to_value(DataStorePayload {
            data_store: DataStoreBody {
                name: "postgis".to_string(),
                connection_parameters: params,
            },
        })
        .unwrap();
        assert_eq!(json["dataStore"]["connectionParameters"]["passwd"], "hunter2");
    }
}
