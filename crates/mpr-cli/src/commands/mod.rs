pub mod config;
pub mod layouts;
pub mod refline;
pub mod simulate;
