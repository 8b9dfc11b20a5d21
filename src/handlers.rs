pub mod auth;
pub mod funnel;
pub mod profile;
