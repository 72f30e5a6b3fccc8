pub mod canonical;

pub use canonical::{canonical_date, parse_date_str};
