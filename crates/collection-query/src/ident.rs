//! Safe SQL identifiers.
//!
//! Table and column names cannot be bound as query parameters, so they are
//! the one thing interpolated into SQL text. [`Ident`] is the only way to get
//! a name into a statement, and it can only be built from a `&'static str`:
//! names come from the allow-list tables compiled into the binary, never from
//! request input. Request values are looked up *in* those tables and the
//! table's own `Ident` is used.

use std::fmt;

/// A validated, `'static` SQL identifier, optionally qualified (`reviews.votes`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ident(&'static str);

impl Ident {
   /// Create an identifier from a literal.
   ///
   /// Meant for `const` allow-list tables, where an invalid name fails the
   /// build instead of reaching SQL.
   ///
   /// # Panics
   ///
   /// Panics if `name` is not a valid identifier.
   pub const fn new(name: &'static str) -> Self {
      assert!(is_valid_identifier(name), "invalid SQL identifier");
      Self(name)
   }

   /// The identifier as written, e.g. `reviews.votes`.
   pub fn as_str(&self) -> &'static str {
      self.0
   }

   /// The unqualified name, e.g. `votes` for `reviews.votes`.
   pub fn name(&self) -> &'static str {
      match self.0.rsplit_once('.') {
         Some((_, name)) => name,
         None => self.0,
      }
   }

   /// The identifier rendered for SQL, each segment double-quoted.
   pub fn quoted(&self) -> String {
      self
         .0
         .split('.')
         .map(quote_identifier)
         .collect::<Vec<_>>()
         .join(".")
   }
}

impl fmt::Display for Ident {
   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
      f.write_str(&self.quoted())
   }
}

/// Check that `name` is one or more `[a-zA-Z_][a-zA-Z0-9_]*` segments joined by `.`.
pub(crate) const fn is_valid_identifier(name: &str) -> bool {
   let bytes = name.as_bytes();
   if bytes.is_empty() {
      return false;
   }

   let mut segment_start = true;
   let mut i = 0;
   while i < bytes.len() {
      let b = bytes[i];
      if segment_start {
         if !(b.is_ascii_alphabetic() || b == b'_') {
            return false;
         }
         segment_start = false;
      } else if b == b'.' {
         segment_start = true;
      } else if !(b.is_ascii_alphanumeric() || b == b'_') {
         return false;
      }
      i += 1;
   }

   !segment_start
}

/// Quote a single identifier segment with double quotes.
///
/// Any embedded double quotes are doubled per SQL standard (`"` → `""`).
pub(crate) fn quote_identifier(name: &str) -> String {
   format!("\"{}\"", name.replace('"', "\"\""))
}
