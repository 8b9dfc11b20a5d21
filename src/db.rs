pub mod store;
pub use store::FunnelStore;
pub mod account_repo;
pub use account_repo::AccountRepository;
pub mod lead_repo;
pub use lead_repo::LeadRepository;
pub mod pg_store;
pub use pg_store::PgFunnelStore;
pub mod memory_store;
pub use memory_store::MemoryFunnelStore;
