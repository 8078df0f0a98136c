use chrono::NaiveDate;
use serde_json::Value;

use crate::data::geometry::Geometry;
use crate::query::expr::Expr;

/// A declarative membership predicate over a feature or image collection.
///
/// Filters are pure values: applying one never mutates the source collection,
/// it yields a new collection handle. Evaluation (and its null-handling
/// semantics) is entirely the platform's.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    expr: Expr,
}

impl Filter {
    pub(crate) fn from_expr(expr: Expr) -> Self {
        Filter { expr }
    }

    pub(crate) fn into_expr(self) -> Expr {
        self.expr
    }

    /// Exact attribute match, e.g. `Filter::eq("HYBAS_ID", 7060382460i64)`.
    pub fn eq(name: &str, value: impl Into<Value>) -> Self {
        Filter::from_expr(Expr::call(
            "Filter.equals",
            [
                ("leftField", Expr::constant(name)),
                ("rightValue", Expr::constant(value.into())),
            ],
        ))
    }

    /// Attribute-comparison expression in the platform's filter grammar,
    /// e.g. `"RIV_ORD <= 6"` or `"CLOUD_COVER < 1"`. Parsed server side.
    pub fn expression(source: &str) -> Self {
        Filter::from_expr(Expr::call(
            "Filter.expression",
            [("expression", Expr::constant(source))],
        ))
    }

    /// Spatial intersection with a reference geometry.
    pub fn bounds(geometry: &Geometry) -> Self {
        Filter::from_expr(Expr::call(
            "Filter.bounds",
            [("geometry", geometry.expr().clone())],
        ))
    }

    /// Membership within `distance_m` meters of a reference geometry, up to
    /// the stated positional error tolerance. An approximation by contract,
    /// not exact spatial arithmetic.
    pub fn within_distance(distance_m: f64, reference: &Geometry, max_error_m: f64) -> Self {
        Filter::from_expr(Expr::call(
            "Filter.withinDistance",
            [
                ("distance", Expr::constant(distance_m)),
                ("leftField", Expr::constant(".geo")),
                ("rightValue", reference.expr().clone()),
                ("maxError", Expr::constant(max_error_m)),
            ],
        ))
    }

    /// Geometry-intersection condition between two collections, by field name.
    /// Used as a join condition.
    pub fn intersects(left_field: &str, right_field: &str) -> Self {
        Filter::from_expr(Expr::call(
            "Filter.intersects",
            [
                ("leftField", Expr::constant(left_field)),
                ("rightField", Expr::constant(right_field)),
            ],
        ))
    }

    /// Half-open acquisition-date window `[start, end)`.
    pub fn date_range(start: NaiveDate, end: NaiveDate) -> Self {
        Filter::from_expr(Expr::call(
            "Filter.dateRange",
            [
                ("start", Expr::constant(start.format("%Y-%m-%d").to_string())),
                ("end", Expr::constant(end.format("%Y-%m-%d").to_string())),
            ],
        ))
    }
}

impl From<&str> for Filter {
    fn from(source: &str) -> Self {
        Filter::expression(source)
    }
}
