//! Categories for grouping transactions.

mod create;
mod db;
mod delete;
mod domain;
mod edit;
mod list;

pub use create::create_category_endpoint;
pub use db::{
    create_category, create_category_table, delete_category, get_category, list_categories,
    map_row_to_category, update_category,
};
pub use delete::delete_category_endpoint;
pub use domain::{Category, CategoryDetails, DEFAULT_COLOUR};
pub use edit::update_category_endpoint;
pub use list::{get_categories_endpoint, get_category_endpoint};
