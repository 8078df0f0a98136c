//! Local materialization products: the sampled-pixel table and the static
//! charts derived from it.

pub mod chart;
pub mod table;
