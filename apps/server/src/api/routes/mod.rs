pub mod business;

pub use business::business_routes;
