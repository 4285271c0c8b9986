pub mod master;
pub mod structs;
pub mod worker;

pub use structs::{ClientLimits, ProxyRuntime};
