pub mod resource_assembler;
