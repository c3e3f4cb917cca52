use std::borrow::Cow;

#[wayfare_derive::wayfare_error]
pub enum ResourceGuardError {
    #[error("Resource validation error{}: {message}", format_context(.context))]
    Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

/// Utilities for safe resource handling and ID validation.
#[derive(Debug)]
pub struct ResourceGuard;

impl ResourceGuard {
    /// Validates a `SurrealDB` record ID string against a specific table.
    ///
    /// Prevents ID spoofing where a client passes an ID from a different table
    /// (e.g. `user:abc` to a booking endpoint).
    ///
    /// # Arguments
    /// * `id` - The ID to verify (e.g. `booking:WF-7KQ2MZ9X` or just `WF-7KQ2MZ9X`)
    /// * `expected_table` - The table the ID must belong to (e.g. `booking`)
    ///
    /// # Errors
    /// Returns an error if the ID names another table or its key is empty.
    pub fn verify<I, T>(id: I, expected_table: T) -> Result<String, ResourceGuardError>
    where
        I: AsRef<str>,
        T: AsRef<str>,
    {
        let table_ref = expected_table.as_ref();
        let key = Self::key(id, table_ref)?;
        Ok(format!("{table_ref}:{key}"))
    }

    /// Like [`verify`](Self::verify) but returns only the key part, ready for
    /// `type::thing($table, $key)` or `(table, key)` record lookups.
    ///
    /// # Errors
    /// Returns an error if the ID names another table or its key is empty.
    pub fn key<I, T>(id: I, expected_table: T) -> Result<String, ResourceGuardError>
    where
        I: AsRef<str>,
        T: AsRef<str>,
    {
        let id_ref = id.as_ref().trim();
        let table_ref = expected_table.as_ref();

        let key = match id_ref.split_once(':') {
            Some((table, key)) if table == table_ref => key,
            Some((table, _)) => {
                return Err(ResourceGuardError::Validation {
                    message: format!("Expected '{table_ref}', got '{table}'").into(),
                    context: Some("ID table mismatch".into()),
                });
            },
            None => id_ref,
        };

        if key.is_empty() {
            return Err(ResourceGuardError::Validation {
                message: "Record key is empty".into(),
                context: Some(table_ref.to_owned().into()),
            });
        }

        Ok(key.to_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_verification() {
        assert_eq!(ResourceGuard::verify("booking:WF-123", "booking").unwrap(), "booking:WF-123");
        assert_eq!(ResourceGuard::verify("WF-123", "booking").unwrap(), "booking:WF-123");

        let err = ResourceGuard::verify("user:config", "booking");
        assert!(err.is_err());
    }

    #[test]
    fn key_strips_table_and_rejects_empty() {
        assert_eq!(ResourceGuard::key("booking:WF-123", "booking").unwrap(), "WF-123");
        assert_eq!(ResourceGuard::key(" WF-123 ", "booking").unwrap(), "WF-123");
        assert!(ResourceGuard::key("booking:", "booking").is_err());
        assert!(ResourceGuard::key("", "booking").is_err());
    }
}
