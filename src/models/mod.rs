pub mod assignment;
pub mod job;
pub mod operator;
