use anyhow::{Context, Result};

use crate::data::feature::Feature;
use crate::data::geometry::Geometry;
use crate::data::primitive::Dictionary;
use crate::engine::session::Session;
use crate::query::expr::Expr;
use crate::query::filter::Filter;
use crate::query::reducer::Reducer;
use crate::report::table::SampleTable;

/// Handle to a platform-side collection of vector features sharing an
/// attribute schema.
///
/// Every operation returns a new handle; nothing is mutated in place and
/// nothing leaves the local process until [`FeatureCollection::to_table`]
/// (or a depending scalar) is materialized.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureCollection {
    expr: Expr,
}

impl FeatureCollection {
    pub(crate) fn from_expr(expr: Expr) -> Self {
        FeatureCollection { expr }
    }

    pub(crate) fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Lazy handle for a named vector dataset. The catalog identifier is an
    /// opaque key into the platform's catalog, not validated locally.
    pub fn load(catalog_id: &str) -> Self {
        FeatureCollection::from_expr(Expr::call(
            "Collection.loadTable",
            [("tableId", Expr::constant(catalog_id))],
        ))
    }

    /// Retain the features matching `filter`. Accepts a [`Filter`] or a
    /// filter-expression string such as `"RIV_ORD <= 6"`.
    pub fn filter(&self, filter: impl Into<Filter>) -> FeatureCollection {
        FeatureCollection::from_expr(Expr::call(
            "Collection.filter",
            [
                ("collection", self.expr.clone()),
                ("filter", filter.into().into_expr()),
            ],
        ))
    }

    /// Retain the features spatially intersecting another collection's
    /// merged geometry.
    pub fn filter_bounds(&self, reference: &FeatureCollection) -> FeatureCollection {
        self.filter(Filter::bounds(&reference.geometry()))
    }

    /// Apply `op` independently to every feature, yielding a collection of
    /// the same cardinality. The callback runs once, locally, over a
    /// parameter reference; the per-feature work happens on the platform.
    pub fn map(&self, op: impl FnOnce(&Feature) -> Feature) -> FeatureCollection {
        let body = op(&Feature::var("feature"));
        FeatureCollection::from_expr(Expr::call(
            "Collection.map",
            [
                ("collection", self.expr.clone()),
                (
                    "function",
                    Expr::function("feature", body.expr().clone()),
                ),
            ],
        ))
    }

    /// Aggregate the named attribute columns with `reducer`. Features lacking
    /// an attribute are skipped per the platform's null-handling convention.
    pub fn reduce_columns(&self, reducer: Reducer, selectors: &[&str]) -> Dictionary {
        Dictionary::from_expr(Expr::call(
            "Collection.reduceColumns",
            [
                ("collection", self.expr.clone()),
                ("reducer", reducer.expr().clone()),
                (
                    "selectors",
                    Expr::constant(
                        selectors
                            .iter()
                            .map(|s| serde_json::Value::from(*s))
                            .collect::<Vec<_>>(),
                    ),
                ),
            ],
        ))
    }

    /// Merged geometry of all features in the collection.
    pub fn geometry(&self) -> Geometry {
        Geometry::from_expr(Expr::call(
            "Collection.geometry",
            [("collection", self.expr.clone())],
        ))
    }

    /// Materialize the collection as a table of numeric attributes, one row
    /// per feature. Blocking I/O: this pulls the platform's GeoJSON response
    /// into the local process.
    pub fn to_table(&self, session: &Session) -> Result<SampleTable> {
        let value = session.evaluate(&self.expr)?;
        let collection: geojson::FeatureCollection = serde_json::from_value(value)
            .context("platform response is not a GeoJSON feature collection")?;
        SampleTable::from_geojson(&collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_filter_chain_is_pure() {
        let basins = FeatureCollection::load("WWF/HydroATLAS/v1/Basins/level06");
        let selected = basins.filter(Filter::eq("HYBAS_ID", 7060382460i64));

        // Source handle untouched by the filter.
        assert_eq!(basins.expr().encode()["functionName"], "Collection.loadTable");
        let encoded = selected.expr().encode();
        assert_eq!(encoded["functionName"], "Collection.filter");
        assert_eq!(
            encoded["arguments"]["collection"]["functionName"],
            "Collection.loadTable"
        );
    }

    #[test]
    fn test_filter_accepts_expression_strings() {
        let rivers = FeatureCollection::load("WWF/HydroSHEDS/v1/FreeFlowingRivers");
        let main_rivers = rivers.filter("RIV_ORD <= 6");
        let encoded = main_rivers.expr().encode();
        assert_eq!(
            encoded["arguments"]["filter"]["functionName"],
            "Filter.expression"
        );
    }

    #[test]
    fn test_map_builds_single_parameter_function() {
        let rivers = FeatureCollection::load("WWF/HydroSHEDS/v1/FreeFlowingRivers");
        let wawa = Geometry::point(geo::Point::new(-118.3430, 46.0646));
        let enriched = rivers.map(|f| {
            f.set("distance_km", f.distance(&wawa, 1.0).divide(1000.0))
        });

        let encoded = enriched.expr().encode();
        assert_eq!(encoded["functionName"], "Collection.map");
        let function = &encoded["arguments"]["function"]["functionDefinition"];
        assert_eq!(function["parameters"], json!(["feature"]));
        assert_eq!(function["body"]["functionName"], "Feature.set");
    }

    #[test]
    fn test_reduce_columns_selectors() {
        let rivers = FeatureCollection::load("WWF/HydroSHEDS/v1/FreeFlowingRivers");
        let total = rivers.reduce_columns(Reducer::sum(), &["LENGTH_KM"]);
        let encoded = total.expr().encode();
        assert_eq!(encoded["functionName"], "Collection.reduceColumns");
        assert_eq!(
            encoded["arguments"]["selectors"],
            json!({ "constantValue": ["LENGTH_KM"] })
        );
    }

    #[test]
    fn test_filter_bounds_uses_reference_geometry() {
        let rivers = FeatureCollection::load("WWF/HydroSHEDS/v1/FreeFlowingRivers");
        let basin = FeatureCollection::load("WWF/HydroATLAS/v1/Basins/level06")
            .filter(Filter::eq("HYBAS_ID", 7060382460i64));
        let inside = rivers.filter_bounds(&basin);

        let encoded = inside.expr().encode();
        let filter = &encoded["arguments"]["filter"];
        assert_eq!(filter["functionName"], "Filter.bounds");
        assert_eq!(
            filter["arguments"]["geometry"]["functionName"],
            "Collection.geometry"
        );
    }
}
