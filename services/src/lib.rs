pub mod criteria;
pub mod role_config;
pub mod stats;
pub mod ticket;
