pub mod budget;
pub mod handler;
pub mod insights;
pub mod new_buyers;
pub mod props;
pub mod retargeting;
pub mod store;
pub mod strategy;

pub use handler::CampaignHandler;
pub use props::CampaignProps;
pub use store::{CampaignStore, InMemoryCampaignStore};
pub use strategy::{CampaignStrategy, PropertyChoice, SupersededCleanup};
