pub mod detection;
pub mod openai_compatible;
pub mod parse;
pub mod request;
pub mod runtime;
