//! Extractors Crate
//!
//! Pure, synchronous building blocks for turning a user's message into
//! transaction candidates. Nothing here performs network I/O.
//!
//! # Modules
//!
//! - `normalizer`: informal amounts ("25rb", "5jt"), category aliases, relative dates
//! - `response`: balanced-brace location of the JSON object in model output
//! - `transaction_parser`: validates model JSON into `TransactionCandidate`s
//! - `sanity`: review flags and adjusted confidence per candidate
//! - `ocr`: receipt preprocessing and multi-mode text recognition
//!
//! # Example
//!
//! ```rust,ignore
//! use extractors::{sanity, transaction_parser};
//!
//! let candidates = transaction_parser::parse(&llm_text)?;
//! for candidate in &candidates {
//!     let review = sanity::check(candidate);
//! }
//! ```

pub mod normalizer;
pub mod ocr;
pub mod response;
pub mod sanity;
pub mod transaction_parser;

pub use normalizer::{normalize_category, parse_amount, parse_amount_text, resolve_tx_date};
pub use response::{extract_json_object, ResponseError};
pub use transaction_parser::{parse as parse_transactions, ParseError};
