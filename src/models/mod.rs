pub mod approval;
pub mod message;
