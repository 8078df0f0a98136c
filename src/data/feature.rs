use crate::data::geometry::Geometry;
use crate::data::primitive::Number;
use crate::query::expr::Expr;

/// Handle to a single platform-side vector feature: a geometry paired with a
/// named-attribute mapping.
///
/// Inside a [`FeatureCollection::map`](crate::data::collection::FeatureCollection::map)
/// callback the handle is a reference to the mapped function's parameter;
/// everything derived from it becomes part of the function body.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    expr: Expr,
}

impl Feature {
    pub(crate) fn from_expr(expr: Expr) -> Self {
        Feature { expr }
    }

    pub(crate) fn var(param: &str) -> Self {
        Feature::from_expr(Expr::Ref(param.to_string()))
    }

    pub(crate) fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Distance in meters from this feature's geometry to a reference
    /// geometry, with the platform's stated error tolerance.
    pub fn distance(&self, reference: &Geometry, max_error_m: f64) -> Number {
        Number::from_expr(Expr::call(
            "Feature.distance",
            [
                ("feature", self.expr.clone()),
                ("right", reference.expr().clone()),
                ("maxError", Expr::constant(max_error_m)),
            ],
        ))
    }

    /// Attach a computed numeric attribute, yielding an enriched feature.
    pub fn set(&self, key: &str, value: impl Into<Number>) -> Feature {
        Feature::from_expr(Expr::call(
            "Feature.set",
            [
                ("feature", self.expr.clone()),
                ("key", Expr::constant(key)),
                ("value", value.into().into_expr()),
            ],
        ))
    }

    /// Look up a stored property, e.g. the feature saved under a join's match
    /// key. The platform types the result; this client treats it as a feature.
    pub fn get(&self, key: &str) -> Feature {
        Feature::from_expr(Expr::call(
            "Feature.get",
            [
                ("feature", self.expr.clone()),
                ("key", Expr::constant(key)),
            ],
        ))
    }

    /// Copy the named properties from `source` onto this feature.
    pub fn copy_properties(&self, source: &Feature, properties: &[&str]) -> Feature {
        Feature::from_expr(Expr::call(
            "Feature.copyProperties",
            [
                ("feature", self.expr.clone()),
                ("source", source.expr.clone()),
                (
                    "properties",
                    Expr::constant(
                        properties
                            .iter()
                            .map(|p| serde_json::Value::from(*p))
                            .collect::<Vec<_>>(),
                    ),
                ),
            ],
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_distance_and_set() {
        let feature = Feature::var("feature");
        let wawa = Geometry::point(geo::Point::new(-118.3430, 46.0646));
        let enriched = feature.set("distance_km", feature.distance(&wawa, 1.0).divide(1000.0));

        let encoded = enriched.expr().encode();
        assert_eq!(encoded["functionName"], "Feature.set");
        assert_eq!(encoded["arguments"]["key"], json!({ "constantValue": "distance_km" }));
        assert_eq!(
            encoded["arguments"]["value"]["functionName"],
            "Number.divide"
        );
        assert_eq!(
            encoded["arguments"]["value"]["arguments"]["left"]["functionName"],
            "Feature.distance"
        );
        // The parameter reference flows into the distance call.
        assert_eq!(
            encoded["arguments"]["feature"],
            json!({ "argumentReference": "feature" })
        );
    }

    #[test]
    fn test_copy_properties() {
        let feature = Feature::var("feature");
        let tract = feature.get("tract");
        let copied = feature.copy_properties(&tract, &["TRACTCE", "NAMELSAD"]);

        let encoded = copied.expr().encode();
        assert_eq!(encoded["functionName"], "Feature.copyProperties");
        assert_eq!(
            encoded["arguments"]["source"]["functionName"],
            "Feature.get"
        );
        assert_eq!(
            encoded["arguments"]["properties"],
            json!({ "constantValue": ["TRACTCE", "NAMELSAD"] })
        );
    }
}
