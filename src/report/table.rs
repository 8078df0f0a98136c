use std::collections::{BTreeMap, BTreeSet};

use anyhow::{Context, Result};
use polars::prelude::{Column, DataFrame};
use serde_json::{Map, Value};

/// Sampled pixels materialized as a local table: one row per pixel, one
/// numeric column per band (including the derived index bands).
///
/// Produced once from the composite's random sample and consumed only for
/// charting and a console preview.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleTable {
    names: Vec<String>,
    columns: BTreeMap<String, Vec<Option<f64>>>,
}

impl SampleTable {
    /// Build the table from the platform's GeoJSON feature response.
    /// Non-numeric properties are dropped; rows missing a band get a null.
    pub fn from_geojson(collection: &geojson::FeatureCollection) -> Result<SampleTable> {
        let mut names: BTreeSet<String> = BTreeSet::new();
        for feature in &collection.features {
            if let Some(properties) = &feature.properties {
                for (key, value) in properties {
                    if value.is_number() {
                        names.insert(key.clone());
                    }
                }
            }
        }

        let names: Vec<String> = names.into_iter().collect();
        let mut columns: BTreeMap<String, Vec<Option<f64>>> = names
            .iter()
            .map(|name| (name.clone(), Vec::with_capacity(collection.features.len())))
            .collect();

        for feature in &collection.features {
            for name in &names {
                let value = feature
                    .properties
                    .as_ref()
                    .and_then(|props| props.get(name))
                    .and_then(Value::as_f64);
                columns
                    .get_mut(name)
                    .expect("column initialized above")
                    .push(value);
            }
        }

        Ok(SampleTable { names, columns })
    }

    pub fn len(&self) -> usize {
        self.columns.values().next().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn column(&self, name: &str) -> Option<&[Option<f64>]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    /// Rows as JSON objects, in table order, for embedding into chart
    /// documents. Missing values become JSON nulls.
    pub fn rows(&self) -> Vec<Value> {
        (0..self.len())
            .map(|row| {
                let mut object = Map::new();
                for name in &self.names {
                    let value = self.columns[name][row]
                        .map(Value::from)
                        .unwrap_or(Value::Null);
                    object.insert(name.clone(), value);
                }
                Value::Object(object)
            })
            .collect()
    }

    /// Convert to a polars DataFrame for inspection and console previews.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let columns: Vec<Column> = self
            .names
            .iter()
            .map(|name| Column::new(name.as_str().into(), self.columns[name].clone()))
            .collect();
        DataFrame::new(columns).context("building DataFrame from sample table")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_collection() -> geojson::FeatureCollection {
        let raw = json!({
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "geometry": null,
                    "properties": { "ndvi": 0.42, "nbr": 0.31, "B4": 0.08, "B5": 0.21, "system:note": "x" }
                },
                {
                    "type": "Feature",
                    "geometry": null,
                    "properties": { "ndvi": 0.10, "B4": 0.12, "B5": 0.15 }
                }
            ]
        });
        serde_json::from_value(raw).unwrap()
    }

    #[test]
    fn test_numeric_columns_only() {
        let table = SampleTable::from_geojson(&sample_collection()).unwrap();
        assert_eq!(table.len(), 2);
        assert!(table.column("ndvi").is_some());
        // Non-numeric property dropped.
        assert!(table.column("system:note").is_none());
    }

    #[test]
    fn test_missing_values_become_null() {
        let table = SampleTable::from_geojson(&sample_collection()).unwrap();
        assert_eq!(table.column("nbr").unwrap(), &[Some(0.31), None]);

        let rows = table.rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["nbr"], json!(0.31));
        assert_eq!(rows[1]["nbr"], Value::Null);
    }

    #[test]
    fn test_to_dataframe_shape() {
        let table = SampleTable::from_geojson(&sample_collection()).unwrap();
        let df = table.to_dataframe().unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 4);
    }
}
