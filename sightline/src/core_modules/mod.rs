pub mod engine;
pub mod line_of_sight;
pub mod occupancy_grid;
pub mod partitioner;
pub mod visibility_table;
