use std::collections::BTreeMap;

use serde_json::{json, Map, Value};

/// One node of a deferred computation graph.
///
/// Nothing in this module talks to the platform: building an expression is a
/// pure, local operation. The graph is serialized with [`Expr::encode`] and
/// shipped to the platform's `value:compute` endpoint only when a handle is
/// explicitly materialized through a [`Session`](crate::engine::session::Session).
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// A literal JSON value (numbers, strings, GeoJSON geometry, lists of names).
    Constant(Value),
    /// A call to a platform-side function, with named arguments.
    Invocation {
        name: String,
        args: BTreeMap<String, Expr>,
    },
    /// An anonymous function, used by the per-element `map` operations.
    Function { params: Vec<String>, body: Box<Expr> },
    /// Reference to a parameter of an enclosing [`Expr::Function`].
    Ref(String),
    /// A list whose elements are themselves expressions.
    List(Vec<Expr>),
    /// A dictionary whose values are themselves expressions.
    Dict(BTreeMap<String, Expr>),
}

impl Expr {
    pub fn constant(value: impl Into<Value>) -> Self {
        Expr::Constant(value.into())
    }

    /// Build an invocation node from a function name and named arguments.
    pub fn call<I>(name: &str, args: I) -> Self
    where
        I: IntoIterator<Item = (&'static str, Expr)>,
    {
        Expr::Invocation {
            name: name.to_string(),
            args: args
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        }
    }

    pub fn function(param: &str, body: Expr) -> Self {
        Expr::Function {
            params: vec![param.to_string()],
            body: Box::new(body),
        }
    }

    /// Serialize the graph to the platform wire encoding.
    pub fn encode(&self) -> Value {
        match self {
            Expr::Constant(v) => json!({ "constantValue": v }),
            Expr::Invocation { name, args } => {
                let mut encoded = Map::new();
                for (key, arg) in args {
                    encoded.insert(key.clone(), arg.encode());
                }
                json!({ "functionName": name, "arguments": Value::Object(encoded) })
            }
            Expr::Function { params, body } => json!({
                "functionDefinition": { "parameters": params, "body": body.encode() }
            }),
            Expr::Ref(name) => json!({ "argumentReference": name }),
            Expr::List(items) => {
                let encoded: Vec<Value> = items.iter().map(Expr::encode).collect();
                json!({ "listValue": encoded })
            }
            Expr::Dict(entries) => {
                let mut encoded = Map::new();
                for (key, entry) in entries {
                    encoded.insert(key.clone(), entry.encode());
                }
                json!({ "dictionaryValue": Value::Object(encoded) })
            }
        }
    }

    /// Number of nodes in the graph, for request logging.
    pub fn node_count(&self) -> usize {
        match self {
            Expr::Constant(_) | Expr::Ref(_) => 1,
            Expr::Invocation { args, .. } => {
                1 + args.values().map(Expr::node_count).sum::<usize>()
            }
            Expr::Function { body, .. } => 1 + body.node_count(),
            Expr::List(items) => 1 + items.iter().map(Expr::node_count).sum::<usize>(),
            Expr::Dict(entries) => 1 + entries.values().map(Expr::node_count).sum::<usize>(),
        }
    }
}
