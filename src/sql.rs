//! Escaped SQL composition.
//!
//! Fragments carry unescaped text tagged with how it must be quoted. Quoting
//! happens only in [`Composite::stringify`], through the connection passed
//! there.
//!
//! ```rust,no_run
//! use pgsession::{Composite, Connection, Fragment};
//!
//! # fn main() -> Result<(), pgsession::PgSessionError> {
//! let conn = Connection::connect("host=localhost dbname=app")?;
//! let query = Composite::new(vec![
//!     Fragment::unsafe_raw("SELECT * FROM ").into(),
//!     Fragment::identifier("users").into(),
//!     Fragment::unsafe_raw(" WHERE name = ").into(),
//!     Fragment::literal("O'Brien").into(),
//! ])?;
//! assert_eq!(
//!     query.stringify(&conn)?,
//!     r#"SELECT * FROM "users" WHERE name = 'O''Brien'"#
//! );
//! # Ok(())
//! # }
//! ```

use std::fmt;

use crate::connection::Connection;
use crate::error::PgSessionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FragmentKind {
    /// Inserted verbatim
    Unsafe,
    Literal,
    Identifier,
}

impl FragmentKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            FragmentKind::Unsafe => "unsafe",
            FragmentKind::Literal => "literal",
            FragmentKind::Identifier => "identifier",
        }
    }
}

/// A piece of SQL text and the quoting it needs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fragment {
    kind: FragmentKind,
    contents: String,
}

impl Fragment {
    /// Raw SQL, never escaped. Only pass trusted text.
    #[must_use]
    pub fn unsafe_raw(text: impl Into<String>) -> Self {
        Self {
            kind: FragmentKind::Unsafe,
            contents: text.into(),
        }
    }

    #[must_use]
    pub fn literal(text: impl Into<String>) -> Self {
        Self {
            kind: FragmentKind::Literal,
            contents: text.into(),
        }
    }

    #[must_use]
    pub fn identifier(text: impl Into<String>) -> Self {
        Self {
            kind: FragmentKind::Identifier,
            contents: text.into(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> FragmentKind {
        self.kind
    }

    #[must_use]
    pub fn contents(&self) -> &str {
        &self.contents
    }

    fn render(&self, conn: &Connection, out: &mut String) -> Result<(), PgSessionError> {
        match self.kind {
            FragmentKind::Unsafe => out.push_str(&self.contents),
            FragmentKind::Literal => out.push_str(&conn.escape_literal(&self.contents)?),
            FragmentKind::Identifier => out.push_str(&conn.escape_identifier(&self.contents)?),
        }
        Ok(())
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<pg/{} {}>", self.kind.as_str(), self.contents)
    }
}

/// One element of a [`Composite`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlPart {
    Fragment(Fragment),
    Composite(Composite),
}

impl From<Fragment> for SqlPart {
    fn from(fragment: Fragment) -> Self {
        SqlPart::Fragment(fragment)
    }
}

impl From<Composite> for SqlPart {
    fn from(composite: Composite) -> Self {
        SqlPart::Composite(composite)
    }
}

/// An ordered, non-empty sequence of parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Composite {
    parts: Vec<SqlPart>,
}

impl Composite {
    /// # Errors
    /// Returns `PgSessionError::EmptyComposite` if `parts` is empty.
    pub fn new(parts: Vec<SqlPart>) -> Result<Self, PgSessionError> {
        if parts.is_empty() {
            return Err(PgSessionError::EmptyComposite);
        }
        Ok(Self { parts })
    }

    #[must_use]
    pub fn parts(&self) -> &[SqlPart] {
        &self.parts
    }

    /// Escape and concatenate every part, in order, with nothing in between.
    ///
    /// # Errors
    /// Returns `PgSessionError::EscapeError` if any literal or identifier
    /// cannot be escaped, including when `conn` is closed.
    pub fn stringify(&self, conn: &Connection) -> Result<String, PgSessionError> {
        let mut out = String::new();
        self.render(conn, &mut out)?;
        tracing::debug!(sql = %out, "stringified composite");
        Ok(out)
    }

    fn render(&self, conn: &Connection, out: &mut String) -> Result<(), PgSessionError> {
        for part in &self.parts {
            match part {
                SqlPart::Fragment(fragment) => fragment.render(conn, out)?,
                SqlPart::Composite(nested) => nested.render(conn, out)?,
            }
        }
        Ok(())
    }
}
