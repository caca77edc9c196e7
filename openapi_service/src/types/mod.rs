pub mod meta;
pub mod resource;

pub use meta::{Meta, Pagination, PaginationLinks};
pub use resource::{Collection, ErrorResource, Item, Resource};
