pub mod connector_classifier;
