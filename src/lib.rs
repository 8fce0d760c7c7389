pub mod config;
pub mod ids;
pub mod integrity;
pub mod models;
pub mod pool;
pub mod scenario;
pub mod store;
pub mod temporal;
pub mod text;
