//! IO utilities for loading the training table.

pub mod table;

pub use table::{read_training_table, TableReaderConfig};
