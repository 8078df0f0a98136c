use crate::data::collection::FeatureCollection;
use crate::query::expr::Expr;
use crate::query::filter::Filter;

/// A spatial join strategy between two feature collections.
///
/// Only the save-first variant is provided: each primary feature keeps the
/// first secondary feature satisfying the condition under the named match
/// key. When several secondaries match, "first" is the platform's internal
/// ordering; no tie-break is guaranteed by this client.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    expr: Expr,
}

impl Join {
    /// Save the first matching secondary feature as the `match_key` property.
    pub fn save_first(match_key: &str) -> Self {
        Join {
            expr: Expr::call(
                "Join.saveFirst",
                [("matchKey", Expr::constant(match_key))],
            ),
        }
    }

    /// Apply the join, yielding a new collection of primary features enriched
    /// with their matched secondary (unmatched primaries are dropped by the
    /// platform's save-first semantics).
    pub fn apply(
        &self,
        primary: &FeatureCollection,
        secondary: &FeatureCollection,
        condition: Filter,
    ) -> FeatureCollection {
        FeatureCollection::from_expr(Expr::call(
            "Join.apply",
            [
                ("join", self.expr.clone()),
                ("primary", primary.expr().clone()),
                ("secondary", secondary.expr().clone()),
                ("condition", condition.into_expr()),
            ],
        ))
    }
}
