use crate::error::{ReshapeError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Product {
    #[serde(rename = "mFRR")]
    Mfrr,
    #[serde(rename = "FCR-N")]
    FcrN,
    #[serde(rename = "FCR-D up")]
    FcrDUp,
    #[serde(rename = "FCR-D down")]
    FcrDDown,
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Product::Mfrr => "mFRR",
            Product::FcrN => "FCR-N",
            Product::FcrDUp => "FCR-D up",
            Product::FcrDDown => "FCR-D down",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::Up => "Up",
            Direction::Down => "Down",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MeasureKind {
    Price,
    Volume,
}

impl MeasureKind {
    pub fn unit(&self) -> &'static str {
        match self {
            MeasureKind::Price => "EUR/MW",
            MeasureKind::Volume => "MW",
        }
    }
}

impl fmt::Display for MeasureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MeasureKind::Price => "Price",
            MeasureKind::Volume => "Volume",
        })
    }
}

/// Meaning of one source column. One row of a mapping CSV.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub column: String,
    pub product: Product,
    pub direction: Option<Direction>,
    pub kind: MeasureKind,
    pub region: Option<String>,
    pub label: Option<String>,
}

impl ColumnSpec {
    fn new(
        column: &str,
        product: Product,
        direction: Option<Direction>,
        kind: MeasureKind,
        region: Option<&str>,
    ) -> Self {
        Self {
            column: column.to_string(),
            product,
            direction,
            kind,
            region: region.map(str::to_string),
            label: None,
        }
    }

    /// Display name of the measurement, e.g. `mFRR Up Price` or `FCR-D up Price`.
    pub fn kind_label(&self) -> String {
        if let Some(label) = &self.label {
            return label.clone();
        }
        match self.direction {
            Some(direction) => format!("{} {} {}", self.product, direction, self.kind),
            None => format!("{} {}", self.product, self.kind),
        }
    }
}

/// Explicit column name -> (product, direction, kind, region) mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaMapping {
    specs: Vec<ColumnSpec>,
}

pub const MFRR_UP_PRICE: &str = "mFRR Upp Pris (EUR/MW)";
pub const MFRR_UP_VOLUME: &str = "mFRR Upp Volym (MW)";
pub const MFRR_DOWN_PRICE: &str = "mFRR Ned Pris (EUR/MW)";
pub const MFRR_DOWN_VOLUME: &str = "mFRR Ned Volym (MW)";

pub const FCR_REGIONS: [&str; 4] = ["SE1", "SE2", "SE3", "SE4"];

impl SchemaMapping {
    pub fn new(specs: Vec<ColumnSpec>) -> Result<Self> {
        for (i, spec) in specs.iter().enumerate() {
            if specs[..i].iter().any(|s| s.column == spec.column) {
                return Err(ReshapeError::Config(format!(
                    "column '{}' is mapped more than once",
                    spec.column
                )));
            }
        }
        Ok(Self { specs })
    }

    /// Columns of the mFRR capacity market export.
    pub fn default_mfrr() -> Self {
        Self {
            specs: vec![
                ColumnSpec::new(MFRR_UP_PRICE, Product::Mfrr, Some(Direction::Up), MeasureKind::Price, None),
                ColumnSpec::new(MFRR_UP_VOLUME, Product::Mfrr, Some(Direction::Up), MeasureKind::Volume, None),
                ColumnSpec::new(MFRR_DOWN_PRICE, Product::Mfrr, Some(Direction::Down), MeasureKind::Price, None),
                ColumnSpec::new(MFRR_DOWN_VOLUME, Product::Mfrr, Some(Direction::Down), MeasureKind::Volume, None),
            ],
        }
    }

    /// FCR price columns, one per product and region: `FCR-N SE1 Pris (EUR/MW)`.
    pub fn default_fcr() -> Self {
        let mut specs = Vec::new();
        for product in [Product::FcrN, Product::FcrDUp, Product::FcrDDown] {
            for region in FCR_REGIONS {
                let column = format!("{} {} Pris (EUR/MW)", product, region);
                specs.push(ColumnSpec::new(&column, product, None, MeasureKind::Price, Some(region)));
            }
        }
        Self { specs }
    }

    /// Loads a mapping CSV with header `column,product,direction,kind,region,label`.
    pub fn from_csv(path: &Path) -> Result<Self> {
        let mut reader = csv::Reader::from_path(path)
            .map_err(|e| ReshapeError::Config(format!("{}: {}", path.display(), e)))?;

        let mut specs = Vec::new();
        for (row, spec) in reader.deserialize::<ColumnSpec>().enumerate() {
            let spec = spec.map_err(|e| {
                ReshapeError::Config(format!("{} row {}: {}", path.display(), row + 1, e))
            })?;
            specs.push(spec);
        }

        if specs.is_empty() {
            return Err(ReshapeError::Config(format!(
                "{}: mapping has no columns",
                path.display()
            )));
        }

        log::debug!("Loaded {} column mappings from {}", specs.len(), path.display());
        Self::new(specs)
    }

    pub fn to_csv(&self, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)
            .map_err(|e| ReshapeError::Config(format!("{}: {}", path.display(), e)))?;
        for spec in &self.specs {
            writer
                .serialize(spec)
                .map_err(|e| ReshapeError::Config(format!("{}: {}", path.display(), e)))?;
        }
        writer
            .flush()
            .map_err(|e| ReshapeError::Config(format!("{}: {}", path.display(), e)))?;
        Ok(())
    }

    pub fn specs(&self) -> &[ColumnSpec] {
        &self.specs
    }

    pub fn columns(&self) -> Vec<String> {
        self.specs.iter().map(|s| s.column.clone()).collect()
    }

    pub fn get(&self, column: &str) -> Option<&ColumnSpec> {
        self.specs.iter().find(|s| s.column == column)
    }

    /// Mapped columns measuring `kind`, in mapping order.
    pub fn columns_of_kind(&self, kind: MeasureKind) -> Vec<&str> {
        self.specs
            .iter()
            .filter(|s| s.kind == kind)
            .map(|s| s.column.as_str())
            .collect()
    }

    pub fn columns_matching(&self, kind: MeasureKind, direction: Direction) -> Vec<&str> {
        self.specs
            .iter()
            .filter(|s| s.kind == kind && s.direction == Some(direction))
            .map(|s| s.column.as_str())
            .collect()
    }

    /// Kind label for a column; unmapped columns keep their own name.
    pub fn kind_label(&self, column: &str) -> String {
        self.get(column)
            .map(ColumnSpec::kind_label)
            .unwrap_or_else(|| column.to_string())
    }

    pub fn region(&self, column: &str) -> Option<&str> {
        self.get(column).and_then(|s| s.region.as_deref())
    }

    pub fn unit(&self, column: &str) -> Option<&'static str> {
        self.get(column).map(|s| s.kind.unit())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_mfrr_labels() {
        let schema = SchemaMapping::default_mfrr();
        assert_eq!(schema.kind_label(MFRR_UP_PRICE), "mFRR Up Price");
        assert_eq!(schema.kind_label(MFRR_DOWN_VOLUME), "mFRR Down Volume");
        assert_eq!(
            schema.columns_of_kind(MeasureKind::Price),
            vec![MFRR_UP_PRICE, MFRR_DOWN_PRICE]
        );
        assert_eq!(
            schema.columns_matching(MeasureKind::Volume, Direction::Up),
            vec![MFRR_UP_VOLUME]
        );
    }

    #[test]
    fn test_default_fcr_regions() {
        let schema = SchemaMapping::default_fcr();
        assert_eq!(schema.specs().len(), 12);
        assert_eq!(schema.region("FCR-D up SE3 Pris (EUR/MW)"), Some("SE3"));
        assert_eq!(schema.kind_label("FCR-N SE1 Pris (EUR/MW)"), "FCR-N Price");
    }

    #[test]
    fn test_unmapped_column_keeps_name() {
        let schema = SchemaMapping::default_mfrr();
        assert_eq!(schema.kind_label("Spot"), "Spot");
        assert_eq!(schema.region("Spot"), None);
        assert_eq!(schema.unit("Spot"), None);
    }

    #[test]
    fn test_duplicate_column_rejected() {
        let spec = ColumnSpec::new("a", Product::Mfrr, None, MeasureKind::Price, None);
        let result = SchemaMapping::new(vec![spec.clone(), spec]);
        assert!(matches!(result, Err(ReshapeError::Config(_))));
    }

    #[test]
    fn test_csv_mapping_with_label_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mapping.csv");
        std::fs::write(
            &path,
            "column,product,direction,kind,region,label\n\
             Upp,mFRR,Up,Price,,Up price\n\
             FCRN_SE2,FCR-N,,Volume,SE2,\n",
        )
        .unwrap();

        let schema = SchemaMapping::from_csv(&path).unwrap();
        assert_eq!(schema.kind_label("Upp"), "Up price");
        assert_eq!(schema.kind_label("FCRN_SE2"), "FCR-N Volume");
        assert_eq!(schema.region("FCRN_SE2"), Some("SE2"));
        assert_eq!(schema.get("FCRN_SE2").unwrap().direction, None);
    }

    #[test]
    fn test_csv_mapping_written_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fcr.csv");
        let schema = SchemaMapping::default_fcr();
        schema.to_csv(&path).unwrap();
        assert_eq!(SchemaMapping::from_csv(&path).unwrap(), schema);
    }

    #[test]
    fn test_csv_mapping_bad_product() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        std::fs::write(&path, "column,product,direction,kind,region,label\nX,aFRR,,Price,,\n").unwrap();
        assert!(matches!(SchemaMapping::from_csv(&path), Err(ReshapeError::Config(_))));
    }
}
