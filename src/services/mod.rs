pub mod catalog;
pub mod credentials;
pub mod lists;
pub mod orchestrator;
pub mod persistence;
pub mod providers;
pub mod registry;
pub mod session;
pub mod settings;
pub mod similarity;

pub use orchestrator::DomainOrchestrator;
pub use registry::Registry;
