pub mod catalog;
pub mod config;
pub mod prompts;
pub mod proctoring;
pub mod random;
pub mod scoring;
pub mod text;
pub mod timer;
pub mod types;

// Keep the public surface small and intentional.
pub use catalog::*;
pub use config::*;
pub use proctoring::*;
pub use random::*;
pub use scoring::*;
pub use text::*;
pub use timer::*;
pub use types::*;
