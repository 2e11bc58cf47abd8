pub mod agent;
pub mod conversation;
pub mod errors;
pub mod evaluator;
pub mod providers;
pub mod tools;
