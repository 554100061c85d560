pub mod attendance;
pub mod employee;
pub mod pages;
pub mod recognition;
pub mod registration;
pub mod stream;
