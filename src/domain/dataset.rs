//! Dataset kinds and their staging schema mappings
//!
//! Every archive the pipeline understands is an [`ArchiveKind`]. Each kind
//! carries a fixed list of [`Dataset`]s, and each dataset knows the GML file
//! it is read from, the staging table it is appended to and the column
//! mapping applied on the way in.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Source attribute to staging column rename
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMapping {
    /// Attribute name in the source GML layer
    pub source: &'static str,

    /// Column name in the staging table
    pub target: &'static str,
}

const fn col(source: &'static str, target: &'static str) -> ColumnMapping {
    ColumnMapping { source, target }
}

/// Geometry attribute exposed by the bulk loader's SQLite dialect
pub const SOURCE_GEOMETRY: &str = "geometry";

/// Canonical geometry column in every staging table
pub const TARGET_GEOMETRY: &str = "geom";

const CADASTRAL_MUNICIPALITY_COLUMNS: &[ColumnMapping] = &[
    col("KATASTARSKA_OPCINA_ID", "id"),
    col("MATICNI_BROJ", "maticni_broj"),
    col("NAZIV", "naziv"),
    col("STATUS_HARMONIZACIJE", "status_harmonizacije"),
    col(SOURCE_GEOMETRY, TARGET_GEOMETRY),
];

const CADASTRAL_PARCEL_COLUMNS: &[ColumnMapping] = &[
    col("CESTICA_ID", "id"),
    col("BROJ_CESTICE", "broj_cestice"),
    col("GRAFICKA_POVRSINA", "graficka_povrsina"),
    col("MATICNI_BROJ_KO", "ko_maticni_broj"),
    col(SOURCE_GEOMETRY, TARGET_GEOMETRY),
];

const BUILDING_COLUMNS: &[ColumnMapping] = &[
    col("ZGRADA_ID", "id"),
    col("BROJ_ZGRADE", "broj_zgrade"),
    col("MATICNI_BROJ_KO", "ko_maticni_broj"),
    col("SIFRA_NACINA_UPORABE", "uporaba_sifra"),
    col(SOURCE_GEOMETRY, TARGET_GEOMETRY),
];

const ADDRESS_COLUMNS: &[ColumnMapping] = &[
    col("localId", "id"),
    col("designator", "house_number"),
    col("component_ThoroughfareName", "street_id"),
    col("component_PostalDescriptor", "postal_office_id"),
    col(SOURCE_GEOMETRY, TARGET_GEOMETRY),
];

const STREET_COLUMNS: &[ColumnMapping] = &[
    col("localId", "id"),
    col("text", "name"),
    col("situatedWithin", "settlement_id"),
    col(SOURCE_GEOMETRY, TARGET_GEOMETRY),
];

const POSTAL_OFFICE_COLUMNS: &[ColumnMapping] = &[
    col("localId", "id"),
    col("postCode", "post_code"),
    col("text", "name"),
    col(SOURCE_GEOMETRY, TARGET_GEOMETRY),
];

/// Projection shared by all administrative unit levels
///
/// `$AU_TYPE` selects the level; `$PARENT` names the parent level's id
/// column. Levels without a parent drop the `NULL AS $PARENT_id,` projection.
pub const ADMINISTRATIVE_UNITS_TEMPLATE: &str = "SELECT localId AS id, \
nationalCode AS national_code, \
text AS name, \
NULL AS $PARENT_id, \
geometry AS geom \
FROM AdministrativeUnit \
WHERE nationalLevelName = '$AU_TYPE'";

/// Level of the national administrative hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminLevel {
    /// National level name as it appears in the source data
    pub national_name: &'static str,

    /// Parent level whose id column is projected, if any
    pub parent: Option<&'static str>,
}

impl AdminLevel {
    /// Substitute this level into an administrative units SQL template
    pub fn render(&self, template: &str) -> String {
        let sql = template.replace("$AU_TYPE", self.national_name);
        match self.parent {
            Some(parent) => sql.replace("$PARENT", parent),
            None => sql.replace("NULL AS $PARENT_id,", ""),
        }
    }
}

/// Archive families published by the national sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchiveKind {
    /// Per-municipality cadastral archives from the ATOM feed (DKP)
    Cadastral,
    /// INSPIRE administrative units (AU)
    AdministrativeUnits,
    /// INSPIRE addresses (AD)
    Addresses,
}

impl ArchiveKind {
    /// All archive kinds in ingest order
    pub const ALL: [ArchiveKind; 3] = [
        ArchiveKind::Cadastral,
        ArchiveKind::AdministrativeUnits,
        ArchiveKind::Addresses,
    ];

    /// Datasets loaded from an archive of this kind, in load order
    pub fn datasets(&self) -> &'static [Dataset] {
        match self {
            ArchiveKind::Cadastral => &[
                Dataset::CadastralMunicipalities,
                Dataset::CadastralParcels,
                Dataset::Buildings,
            ],
            ArchiveKind::AdministrativeUnits => &[
                Dataset::Country,
                Dataset::County,
                Dataset::Municipality,
                Dataset::Settlement,
            ],
            ArchiveKind::Addresses => {
                &[Dataset::Addresses, Dataset::Streets, Dataset::PostalOffices]
            }
        }
    }

    /// Sub-directory of the downloads directory used for this kind
    pub fn directory(&self) -> &'static str {
        match self {
            ArchiveKind::Cadastral => "dkp",
            ArchiveKind::AdministrativeUnits => "au",
            ArchiveKind::Addresses => "ad",
        }
    }

    /// Short name used in logs and configuration
    pub fn as_str(&self) -> &'static str {
        match self {
            ArchiveKind::Cadastral => "cadastral",
            ArchiveKind::AdministrativeUnits => "administrative_units",
            ArchiveKind::Addresses => "addresses",
        }
    }
}

impl fmt::Display for ArchiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArchiveKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cadastral" | "dkp" => Ok(ArchiveKind::Cadastral),
            "administrative_units" | "au" => Ok(ArchiveKind::AdministrativeUnits),
            "addresses" | "ad" => Ok(ArchiveKind::Addresses),
            other => Err(format!("Unknown archive kind '{other}'")),
        }
    }
}

/// One staging dataset loaded from a GML file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dataset {
    CadastralMunicipalities,
    CadastralParcels,
    Buildings,
    Country,
    County,
    Municipality,
    Settlement,
    Addresses,
    Streets,
    PostalOffices,
}

impl Dataset {
    /// Dataset name, also the suffix of its staging table
    pub fn name(&self) -> &'static str {
        match self {
            Dataset::CadastralMunicipalities => "cadastral_municipalities",
            Dataset::CadastralParcels => "cadastral_parcels",
            Dataset::Buildings => "buildings",
            Dataset::Country => "country",
            Dataset::County => "county",
            Dataset::Municipality => "municipality",
            Dataset::Settlement => "settlement",
            Dataset::Addresses => "addresses",
            Dataset::Streets => "streets",
            Dataset::PostalOffices => "postal_offices",
        }
    }

    /// GML file expected inside the archive
    pub fn source_file(&self) -> &'static str {
        match self {
            Dataset::CadastralMunicipalities => "cadastral_municipalities.gml",
            Dataset::CadastralParcels => "cadastral_parcels.gml",
            Dataset::Buildings => "buildings.gml",
            Dataset::Country | Dataset::County | Dataset::Municipality | Dataset::Settlement => {
                "AdministrativeUnits.gml"
            }
            Dataset::Addresses => "Address.gml",
            Dataset::Streets => "ThoroughfareName.gml",
            Dataset::PostalOffices => "PostalDescriptor.gml",
        }
    }

    /// Feature layer read from the GML file
    pub fn source_layer(&self) -> &'static str {
        match self {
            Dataset::CadastralMunicipalities => "cadastral_municipalities",
            Dataset::CadastralParcels => "cadastral_parcels",
            Dataset::Buildings => "buildings",
            Dataset::Country | Dataset::County | Dataset::Municipality | Dataset::Settlement => {
                "AdministrativeUnit"
            }
            Dataset::Addresses => "Address",
            Dataset::Streets => "ThoroughfareName",
            Dataset::PostalOffices => "PostalDescriptor",
        }
    }

    /// Unqualified staging table name
    pub fn staging_table(&self) -> String {
        format!("u_{}", self.name())
    }

    /// Administrative level, for datasets cut from the AU file
    pub fn admin_level(&self) -> Option<AdminLevel> {
        let (national_name, parent) = match self {
            Dataset::Country => ("Država", None),
            Dataset::County => ("Županija", None),
            Dataset::Municipality => ("Jedinica lokalne samouprave", Some("county")),
            Dataset::Settlement => ("Naselje", Some("municipality")),
            _ => return None,
        };
        Some(AdminLevel {
            national_name,
            parent,
        })
    }

    /// Declarative column mapping (empty for template-driven datasets)
    pub fn column_mapping(&self) -> &'static [ColumnMapping] {
        match self {
            Dataset::CadastralMunicipalities => CADASTRAL_MUNICIPALITY_COLUMNS,
            Dataset::CadastralParcels => CADASTRAL_PARCEL_COLUMNS,
            Dataset::Buildings => BUILDING_COLUMNS,
            Dataset::Addresses => ADDRESS_COLUMNS,
            Dataset::Streets => STREET_COLUMNS,
            Dataset::PostalOffices => POSTAL_OFFICE_COLUMNS,
            Dataset::Country | Dataset::County | Dataset::Municipality | Dataset::Settlement => &[],
        }
    }

    /// Base name of the SQL template file that may override [`select_sql`](Self::select_sql)
    ///
    /// The four administrative levels share one template.
    pub fn template_name(&self) -> &'static str {
        if self.admin_level().is_some() {
            "administrative_units"
        } else {
            self.name()
        }
    }

    /// Inline SQL selecting and renaming the source attributes
    pub fn select_sql(&self) -> String {
        if let Some(level) = self.admin_level() {
            return level.render(ADMINISTRATIVE_UNITS_TEMPLATE);
        }

        let projection = self
            .column_mapping()
            .iter()
            .map(|mapping| format!("{} AS {}", mapping.source, mapping.target))
            .collect::<Vec<_>>()
            .join(", ");
        format!("SELECT {projection} FROM {}", self.source_layer())
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_dataset_renames_geometry() {
        for kind in ArchiveKind::ALL {
            for dataset in kind.datasets() {
                let sql = dataset.select_sql();
                assert!(
                    sql.contains("geometry AS geom"),
                    "{dataset} does not map its geometry: {sql}"
                );
            }
        }
    }

    #[test]
    fn test_template_name() {
        assert_eq!(Dataset::Settlement.template_name(), "administrative_units");
        assert_eq!(Dataset::Country.template_name(), "administrative_units");
        assert_eq!(Dataset::Streets.template_name(), "streets");
    }

    #[test]
    fn test_cadastral_parcels_sql() {
        assert_eq!(
            Dataset::CadastralParcels.select_sql(),
            "SELECT CESTICA_ID AS id, BROJ_CESTICE AS broj_cestice, \
             GRAFICKA_POVRSINA AS graficka_povrsina, MATICNI_BROJ_KO AS ko_maticni_broj, \
             geometry AS geom FROM cadastral_parcels"
        );
    }

    #[test]
    fn test_admin_level_without_parent_drops_parent_column() {
        let sql = Dataset::County.select_sql();
        assert!(!sql.contains("$PARENT"));
        assert!(!sql.contains("NULL AS"));
        assert!(sql.contains("nationalLevelName = 'Županija'"));
    }

    #[test]
    fn test_admin_level_with_parent_projects_parent_id() {
        let sql = Dataset::Settlement.select_sql();
        assert!(sql.contains("NULL AS municipality_id,"));
        assert!(sql.contains("nationalLevelName = 'Naselje'"));
        assert!(!sql.contains('$'));
    }

    #[test]
    fn test_admin_units_share_one_source_file() {
        let files: Vec<_> = ArchiveKind::AdministrativeUnits
            .datasets()
            .iter()
            .map(|d| d.source_file())
            .collect();
        assert_eq!(files, vec!["AdministrativeUnits.gml"; 4]);
    }

    #[test]
    fn test_staging_tables() {
        assert_eq!(Dataset::Buildings.staging_table(), "u_buildings");
        assert_eq!(Dataset::Country.staging_table(), "u_country");
        assert_eq!(Dataset::PostalOffices.staging_table(), "u_postal_offices");
    }

    #[test]
    fn test_archive_kind_from_str() {
        assert_eq!("dkp".parse::<ArchiveKind>(), Ok(ArchiveKind::Cadastral));
        assert_eq!(
            "administrative_units".parse::<ArchiveKind>(),
            Ok(ArchiveKind::AdministrativeUnits)
        );
        assert!("rpj".parse::<ArchiveKind>().is_err());
    }
}
