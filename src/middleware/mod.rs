pub mod http;
pub mod policy;
