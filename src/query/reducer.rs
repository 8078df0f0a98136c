use crate::data::primitive::Number;
use crate::query::expr::Expr;

/// An aggregation computed by the platform over a collection of attribute
/// values, or over the pixels of a region.
#[derive(Debug, Clone, PartialEq)]
pub struct Reducer {
    expr: Expr,
}

impl Reducer {
    pub(crate) fn expr(&self) -> &Expr {
        &self.expr
    }

    fn simple(name: &str) -> Self {
        Reducer {
            expr: Expr::Invocation {
                name: name.to_string(),
                args: Default::default(),
            },
        }
    }

    pub fn sum() -> Self {
        Reducer::simple("Reducer.sum")
    }

    pub fn mean() -> Self {
        Reducer::simple("Reducer.mean")
    }

    pub fn median() -> Self {
        Reducer::simple("Reducer.median")
    }

    /// Minimum and maximum in a single pass; yields a dictionary with
    /// `min` and `max` outputs.
    pub fn min_max() -> Self {
        Reducer::simple("Reducer.minMax")
    }

    /// Per-band maximum over `num_inputs` aligned inputs; the arity may be a
    /// computed number (e.g. a band count that only exists server side).
    pub fn max_n(num_inputs: impl Into<Number>) -> Self {
        Reducer {
            expr: Expr::call(
                "Reducer.max",
                [("numInputs", num_inputs.into().into_expr())],
            ),
        }
    }
}
