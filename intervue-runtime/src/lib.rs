pub mod config_store;
pub mod defaults;
pub mod detector;
pub mod llm;
pub mod mock;
pub mod runtime_engine;
pub mod secrets;
pub mod store;
