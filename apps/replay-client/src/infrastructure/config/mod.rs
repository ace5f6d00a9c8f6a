//! Configuration Module
//!
//! Configuration loading for the replay client.

mod settings;

pub use settings::{
    FeedSettings, ReplayConfig, ReplayMode, SubscriptionSettings, UploadSettings,
};
