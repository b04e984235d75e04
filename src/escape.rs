//! Quoting rules for literals and identifiers.
//!
//! Output matches libpq's `PQescapeLiteral` / `PQescapeIdentifier` for a UTF-8
//! client encoding, which is the only encoding `tokio-postgres` negotiates.

use postgres_protocol::escape;

use crate::driver::DriverError;

fn reject_nul(text: &str) -> Result<(), DriverError> {
    if text.contains('\0') {
        return Err(DriverError::new("string contains a NUL byte"));
    }
    Ok(())
}

/// Quote a string literal. A literal holding a backslash gets the ` E'..'` form.
///
/// # Errors
/// Returns `DriverError` if the text contains a NUL byte.
pub fn quote_literal(text: &str) -> Result<String, DriverError> {
    reject_nul(text)?;
    Ok(escape::escape_literal(text))
}

/// Quote an identifier.
///
/// # Errors
/// Returns `DriverError` if the text contains a NUL byte.
pub fn quote_identifier(text: &str) -> Result<String, DriverError> {
    reject_nul(text)?;
    Ok(escape::escape_identifier(text))
}
