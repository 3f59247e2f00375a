pub mod integrations;
pub mod server;
pub mod sse;
pub mod stdio;
pub mod tools;
pub mod transport;
