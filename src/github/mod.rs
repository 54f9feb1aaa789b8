pub mod client;
pub mod models;

pub use self::client::*;
pub use self::models::*;
