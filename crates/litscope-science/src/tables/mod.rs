pub mod category;
pub mod maps;
pub mod tools;

pub use maps::TableMaps;
pub use tools::CitedTool;
