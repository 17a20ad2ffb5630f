pub mod client;
pub mod dialect;
pub mod row_mapper;
