//! The Walla Walla basin analysis pipeline built on the query layer.

pub mod basin;
