pub mod prelude;

pub mod contact_messages;
pub mod content_blocks;
pub mod courses;
pub mod departments;
pub mod events;
pub mod faqs;
pub mod gallery_items;
pub mod settings;
pub mod subscribers;
pub mod users;
