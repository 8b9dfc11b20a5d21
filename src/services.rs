pub mod age;
pub mod pricing;
pub mod payment;
pub mod settlement;
pub mod routing;
pub mod quote_machine;
pub mod locks;
pub mod auth;
pub use auth::AuthService;
pub mod funnel_service;
pub use funnel_service::FunnelService;
