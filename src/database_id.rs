//! Database ID type definitions.

/// Alias for the integer type used for mapping to database IDs.
pub type DatabaseId = i64;

/// Database identifier for a spending or income transaction.
pub type TransactionId = DatabaseId;

/// Database identifier for a recurring rule.
pub type RuleId = DatabaseId;
