pub mod fixture;
pub mod logging;
