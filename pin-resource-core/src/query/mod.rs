pub mod connector_query;
pub mod strategy;
