//! Layer catalog entries consumed by the publication step

use serde::{Deserialize, Serialize};

/// One layer to expose through the map server
///
/// Read-only input to publication; loaded from the `[[layers]]` configuration
/// tables or [`default_catalog`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerCatalogEntry {
    /// Catalog identifier (e.g. `cadastral_parcels`)
    pub id: String,

    /// Display title
    #[serde(default)]
    pub title: String,

    /// Published layer name
    pub wms_name: String,

    /// Schema-qualified source table or view (e.g. `gs.v_cadastral_parcels`)
    pub native_table: String,

    /// Remote workspace the layer belongs to
    #[serde(default)]
    pub workspace: String,
}

impl LayerCatalogEntry {
    /// Create an entry whose title and layer name derive from the id
    pub fn new(id: &str, native_table: &str, workspace: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title_from_id(id),
            wms_name: id.to_string(),
            native_table: native_table.to_string(),
            workspace: workspace.to_string(),
        }
    }

    /// Split `native_table` into schema and table, defaulting the schema to `public`
    pub fn schema_and_table(&self) -> (&str, &str) {
        match self.native_table.split_once('.') {
            Some((schema, table)) => (schema, table),
            None => ("public", self.native_table.as_str()),
        }
    }

    /// Unqualified native table name
    pub fn table_name(&self) -> &str {
        self.schema_and_table().1
    }

    /// Title, falling back to one derived from the id
    pub fn display_title(&self) -> String {
        if self.title.is_empty() {
            title_from_id(&self.id)
        } else {
            self.title.clone()
        }
    }
}

/// Native bounding box of a layer's source table
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub minx: f64,
    pub miny: f64,
    pub maxx: f64,
    pub maxy: f64,
}

impl Extent {
    /// Build an extent from nullable aggregate columns
    ///
    /// An empty table yields NULL aggregates, which become zeros.
    pub fn from_nullable(
        minx: Option<f64>,
        miny: Option<f64>,
        maxx: Option<f64>,
        maxy: Option<f64>,
    ) -> Self {
        Self {
            minx: minx.unwrap_or(0.0),
            miny: miny.unwrap_or(0.0),
            maxx: maxx.unwrap_or(0.0),
            maxy: maxy.unwrap_or(0.0),
        }
    }

    /// Whether the extent is the all-zero placeholder
    pub fn is_empty(&self) -> bool {
        *self == Extent::default()
    }
}

/// `cadastral_parcels` becomes `Cadastral Parcels`
pub fn title_from_id(id: &str) -> String {
    id.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// The production layer catalog
pub fn default_catalog(workspace: &str) -> Vec<LayerCatalogEntry> {
    [
        ("cadastral_parcels", "gs.v_cadastral_parcels"),
        ("cadastral_municipalities", "gs.v_cadastral_municipalities"),
        ("counties", "gs.v_counties"),
        ("municipalities", "gs.v_municipalities"),
        ("settlements", "gs.v_settlements"),
        ("streets", "gs.mv_streets"),
        ("addresses", "gs.v_addresses"),
    ]
    .iter()
    .map(|(id, table)| LayerCatalogEntry::new(id, table, workspace))
    .collect()
}
