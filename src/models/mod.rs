mod category;
mod listing;
mod news;
mod order;
mod revenue;
mod review;
mod settings;
mod staff;

/// Whole naira. Prices in the catalog carry no kobo.
pub type Naira = i64;

pub use category::Category;
pub use listing::{Listing, ListingDraft};
pub use news::{Article, ArticleSource, NewsFeed};
pub use order::{Order, OrderChannel, OrderStatus};
pub use revenue::{RevenueTotals, RolloverReport};
pub use review::Review;
pub use settings::{
    AboutContent, AboutStat, ContactSettings, ContactUpdate, HomepageContent, HomepageStat,
    LegalContent, LivestockPageHeader, Milestone, ValueCard,
};
pub use staff::{Role, StaffMember};
