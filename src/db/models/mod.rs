//! Database models, one module per table plus the joined read models built on
//! top of them.

pub mod gift_list;
pub mod item;
pub mod permission;
pub mod user;

pub use self::gift_list::*;
pub use self::item::*;
pub use self::permission::*;
pub use self::user::*;
