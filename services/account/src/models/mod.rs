//! Account service models

pub mod channel;
pub mod user;
pub mod video;

// Re-export for convenience
pub use channel::ChannelProfile;
pub use user::{
    AuthPayload, ChangePasswordRequest, LoginRequest, NewUser, RefreshRequest, TokenPair,
    UpdateAccountRequest, User, UserResponse,
};
pub use video::{VideoOwner, WatchHistoryVideo};
