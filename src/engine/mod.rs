pub mod assignment;
pub mod candidates;
pub mod reference;
pub mod selection;
