pub mod assignment;
pub mod shipment;
pub mod user;
