pub mod inquiry_service;
pub mod item_service;
pub mod listing_service;
pub mod saga;
pub mod user_service;

pub use inquiry_service::InquiryService;
pub use item_service::ItemService;
pub use listing_service::ListingService;
pub use saga::Saga;
pub use user_service::UserService;
