pub mod analytics;
pub mod audit;
pub mod document;
pub mod policy;
