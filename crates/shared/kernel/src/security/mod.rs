pub mod bearer;
pub mod resource;
