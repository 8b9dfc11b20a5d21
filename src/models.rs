pub mod account;
pub mod auth;
pub mod funnel;
pub mod lead;
