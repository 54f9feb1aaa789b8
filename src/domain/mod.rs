pub mod prs;
pub mod schema;
