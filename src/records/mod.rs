// Review records — data models and CSV table I/O.

pub mod models;
pub mod table;
