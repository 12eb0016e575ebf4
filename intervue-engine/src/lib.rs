pub mod actor;
pub mod engine;
pub mod session;
pub mod traits;
