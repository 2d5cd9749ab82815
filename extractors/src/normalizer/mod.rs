mod amount;
mod category;
mod date;

pub use amount::{parse_amount, parse_amount_text};
pub use category::{normalize_category, CategoryNormalization};
pub use date::resolve_tx_date;
