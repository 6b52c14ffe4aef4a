pub mod access;
pub mod auth;
pub mod init;
pub mod lists;
pub mod sharing;
pub mod validation;
