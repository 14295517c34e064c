// Batch pipelines — each one reads a whole table and writes a whole table.

pub mod thematic;
