pub mod completion;
pub mod config;
pub mod info;
pub mod session;
