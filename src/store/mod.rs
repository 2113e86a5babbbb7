//! Backends for the append-only ledgers

pub mod csv_file;
pub mod memory;

pub use csv_file::CsvLog;
pub use memory::MemoryLog;
