pub mod audit;
pub mod enumeration;
pub mod errors;
pub mod job;
pub mod report;
pub mod stats;
pub mod store;
pub mod transfer;
pub mod transfer_engine;
