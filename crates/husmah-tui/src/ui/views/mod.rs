pub mod access;
pub mod account;
pub mod forms;
pub mod projects;
