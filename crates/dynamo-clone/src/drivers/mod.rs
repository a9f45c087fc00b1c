//! Concrete table-store drivers.

pub mod dynamo;
