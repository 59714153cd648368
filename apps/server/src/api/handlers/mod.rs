pub mod business;
pub mod system;
