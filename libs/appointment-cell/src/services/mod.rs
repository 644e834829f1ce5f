pub mod booking;
pub mod guard;
pub mod lifecycle;
pub mod store;
