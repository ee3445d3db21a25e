use serde::{Deserialize, Serialize};
use sqlx::any::AnyRow;
use sqlx::{FromRow, Row};

/// A single stored comment.
///
/// `id` is assigned by storage on insert; an unsaved comment carries `0`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
   pub id: i32,
   pub email: String,
   pub comment: String,
}

impl Comment {
   /// A comment that has not been stored yet.
   pub fn new(email: impl Into<String>, comment: impl Into<String>) -> Self {
      Self {
         id: 0,
         email: email.into(),
         comment: comment.into(),
      }
   }

   /// Whether storage has assigned this comment an id.
   pub fn is_persisted(&self) -> bool {
      self.id != 0
   }
}

impl<'r> FromRow<'r, AnyRow> for Comment {
   fn from_row(row: &'r AnyRow) -> Result<Self, sqlx::Error> {
      // MySQL reports INT, SQLite reports its 64-bit INTEGER
      let id = match row.try_get::<i32, _>("id") {
         Ok(id) => id,
         Err(_) => {
            let wide: i64 = row.try_get("id")?;
            i32::try_from(wide).map_err(|e| sqlx::Error::ColumnDecode {
               index: "id".to_string(),
               source: Box::new(e),
            })?
         }
      };

      Ok(Self {
         id,
         email: text_column(row, "email")?,
         comment: text_column(row, "comment")?,
      })
   }
}

/// Read a text column, accepting the byte form as well.
///
/// MySQL reports `TEXT` columns with a BLOB wire type, which the `Any` driver
/// passes on as bytes rather than a string.
fn text_column(row: &AnyRow, column: &str) -> Result<String, sqlx::Error> {
   if let Ok(text) = row.try_get::<String, _>(column) {
      return Ok(text);
   }

   let bytes: Vec<u8> = row.try_get(column)?;
   String::from_utf8(bytes).map_err(|e| sqlx::Error::ColumnDecode {
      index: column.to_string(),
      source: Box::new(e),
   })
}
