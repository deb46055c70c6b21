pub mod message;
pub mod mode;
pub mod session;
