// Library root — the assistant core plus the ambient pieces the binary wires up.
// The binary entry point is src/main.rs.

pub mod assistant;
pub mod config;
pub mod console;
pub mod error;
pub mod logger;
