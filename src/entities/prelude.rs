pub use super::contact_messages::Entity as ContactMessages;
pub use super::content_blocks::Entity as ContentBlocks;
pub use super::courses::Entity as Courses;
pub use super::departments::Entity as Departments;
pub use super::events::Entity as Events;
pub use super::faqs::Entity as Faqs;
pub use super::gallery_items::Entity as GalleryItems;
pub use super::settings::Entity as Settings;
pub use super::subscribers::Entity as Subscribers;
pub use super::users::Entity as Users;
