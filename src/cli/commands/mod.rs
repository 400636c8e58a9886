mod admin;
mod seed;

pub use admin::cmd_create_admin;
pub use seed::cmd_seed;
