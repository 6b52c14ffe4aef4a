pub mod gift_list;
pub mod item;
pub mod permission;
pub mod user;

pub use gift_list::GiftListRepository;
pub use item::GiftListItemRepository;
pub use permission::PermissionRepository;
pub use user::UserRepository;
