pub mod toml_loader;

pub use toml_loader::{load_shopping_list, parse_shopping_list, parse_shorthand, ShoppingList};
