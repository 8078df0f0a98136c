//! Declarative building blocks for platform-side queries: the expression
//! graph itself, plus filters, reducers, and joins layered on top of it.

pub mod expr;
pub mod filter;
pub mod join;
pub mod reducer;
