pub mod contact;
pub mod content;
pub mod settings;
pub mod subscriber;
pub mod user;
