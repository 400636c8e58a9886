pub mod content;
pub mod subscriber;
pub mod user;
pub mod validation;
