pub mod feedback;
pub mod filter;
pub mod map;
pub mod merge;
