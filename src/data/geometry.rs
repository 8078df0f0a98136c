use serde_json::json;

use crate::query::expr::Expr;

/// Handle to a platform-side geometry, without attributes.
///
/// Derived geometries (buffers, differences) are new immutable handles; the
/// actual coordinate work happens on the platform when a depending value is
/// materialized.
#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    expr: Expr,
}

impl Geometry {
    pub(crate) fn from_expr(expr: Expr) -> Self {
        Geometry { expr }
    }

    pub(crate) fn expr(&self) -> &Expr {
        &self.expr
    }

    /// A point literal from lon/lat coordinates (CRS implicit, WGS84).
    pub fn point(point: geo::Point<f64>) -> Self {
        Geometry::from_expr(Expr::call(
            "GeometryConstructors.Point",
            [("coordinates", Expr::constant(json!([point.x(), point.y()])))],
        ))
    }

    /// Expand the geometry outward by `distance_m` meters. `max_error_m` is a
    /// precision/performance knob of the platform, not a correctness choice.
    pub fn buffer(&self, distance_m: f64, max_error_m: f64) -> Geometry {
        Geometry::from_expr(Expr::call(
            "Geometry.buffer",
            [
                ("geometry", self.expr.clone()),
                ("distance", Expr::constant(distance_m)),
                ("maxError", Expr::constant(max_error_m)),
            ],
        ))
    }

    /// Point set of `self` minus `other`.
    pub fn difference(&self, other: &Geometry, max_error_m: f64) -> Geometry {
        Geometry::from_expr(Expr::call(
            "Geometry.difference",
            [
                ("left", self.expr.clone()),
                ("right", other.expr.clone()),
                ("maxError", Expr::constant(max_error_m)),
            ],
        ))
    }
}
