pub mod batch;
pub mod client;
pub mod judge;
pub mod table;
pub mod types;
