use anyhow::{Context, Result};
use serde_json::{Map, Value};

use crate::engine::session::Session;
use crate::query::expr::Expr;

/// Handle to a platform-side scalar.
///
/// [`Number::fetch`] is one of the few materialization points in the client:
/// it blocks on a round trip to the platform and is where query failures
/// actually surface.
#[derive(Debug, Clone, PartialEq)]
pub struct Number {
    expr: Expr,
}

impl Number {
    pub(crate) fn from_expr(expr: Expr) -> Self {
        Number { expr }
    }

    pub(crate) fn expr(&self) -> &Expr {
        &self.expr
    }

    pub(crate) fn into_expr(self) -> Expr {
        self.expr
    }

    fn binary(self, name: &str, rhs: impl Into<Number>) -> Number {
        Number::from_expr(Expr::call(
            name,
            [("left", self.expr), ("right", rhs.into().expr)],
        ))
    }

    pub fn add(self, rhs: impl Into<Number>) -> Number {
        self.binary("Number.add", rhs)
    }

    pub fn subtract(self, rhs: impl Into<Number>) -> Number {
        self.binary("Number.subtract", rhs)
    }

    pub fn multiply(self, rhs: impl Into<Number>) -> Number {
        self.binary("Number.multiply", rhs)
    }

    pub fn divide(self, rhs: impl Into<Number>) -> Number {
        self.binary("Number.divide", rhs)
    }

    /// Evaluate the graph on the platform and pull the scalar result.
    /// Blocking I/O; any platform-side failure propagates from here.
    pub fn fetch(&self, session: &Session) -> Result<f64> {
        let value = session.evaluate(&self.expr)?;
        value
            .as_f64()
            .with_context(|| format!("platform returned a non-numeric value: {}", value))
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Number::from_expr(Expr::constant(value))
    }
}

impl From<i64> for Number {
    fn from(value: i64) -> Self {
        Number::from_expr(Expr::constant(value))
    }
}

impl From<i32> for Number {
    fn from(value: i32) -> Self {
        Number::from_expr(Expr::constant(value))
    }
}

impl From<u32> for Number {
    fn from(value: u32) -> Self {
        Number::from_expr(Expr::constant(value))
    }
}

/// Handle to a platform-side list (e.g. a computed band-name list).
#[derive(Debug, Clone, PartialEq)]
pub struct List {
    expr: Expr,
}

impl List {
    pub(crate) fn from_expr(expr: Expr) -> Self {
        List { expr }
    }

    pub(crate) fn expr(&self) -> &Expr {
        &self.expr
    }

    pub fn size(&self) -> Number {
        Number::from_expr(Expr::call("List.size", [("list", self.expr.clone())]))
    }
}

impl From<&[&str]> for List {
    fn from(names: &[&str]) -> Self {
        List::from_expr(Expr::constant(Value::from(
            names.iter().map(|n| Value::from(*n)).collect::<Vec<_>>(),
        )))
    }
}

/// Handle to a platform-side dictionary, as produced by column and region
/// reductions. Individual outputs are addressed lazily by key.
#[derive(Debug, Clone, PartialEq)]
pub struct Dictionary {
    expr: Expr,
}

impl Dictionary {
    pub(crate) fn from_expr(expr: Expr) -> Self {
        Dictionary { expr }
    }

    pub(crate) fn expr(&self) -> &Expr {
        &self.expr
    }

    /// Lazy lookup of one numeric output, e.g. the `"sum"` of a sum reducer.
    pub fn get_number(&self, key: &str) -> Number {
        Number::from_expr(Expr::call(
            "Dictionary.get",
            [
                ("dictionary", self.expr.clone()),
                ("key", Expr::constant(key)),
            ],
        ))
    }

    /// Materialize the whole dictionary. Blocking I/O.
    pub fn fetch(&self, session: &Session) -> Result<Map<String, Value>> {
        let value = session.evaluate(&self.expr)?;
        match value {
            Value::Object(map) => Ok(map),
            other => anyhow::bail!("platform returned a non-dictionary value: {}", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_number_arithmetic_graph() {
        let km = Number::from(2500.0).divide(1000.0);
        let encoded = km.expr().encode();
        assert_eq!(encoded["functionName"], "Number.divide");
        assert_eq!(
            encoded["arguments"]["right"],
            json!({ "constantValue": 1000.0 })
        );
    }

    #[test]
    fn test_dictionary_get_number() {
        let dict = Dictionary::from_expr(Expr::constant(json!({ "sum": 12.0 })));
        let number = dict.get_number("sum");
        let encoded = number.expr().encode();
        assert_eq!(encoded["functionName"], "Dictionary.get");
        assert_eq!(encoded["arguments"]["key"], json!({ "constantValue": "sum" }));
    }

    #[test]
    fn test_list_size() {
        let list: List = (&["ndvi", "nbr"][..]).into();
        let encoded = list.size().expr().encode();
        assert_eq!(encoded["functionName"], "List.size");
        assert_eq!(
            encoded["arguments"]["list"],
            json!({ "constantValue": ["ndvi", "nbr"] })
        );
    }
}
