//! Repositories for database operations

pub mod channel;
pub mod user;

// Re-export for convenience
pub use channel::ChannelRepository;
pub use user::UserRepository;
