pub mod capture;
pub use capture::*;

pub mod configuration;
pub use configuration::*;

pub mod error_handling;

pub mod web_interface;
pub use web_interface::*;
