pub mod admin;
pub mod audit;
pub mod knowledge;
pub mod session;
pub mod village;
