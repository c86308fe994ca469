pub mod property_blob;
