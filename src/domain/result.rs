//! Result type alias for Toggl Ledger

use super::errors::SyncError;

/// Result type alias for Toggl Ledger operations
///
/// # Examples
///
/// ```
/// use toggl_ledger::domain::result::Result;
/// use toggl_ledger::domain::errors::SyncError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(SyncError::Rotation("rename failed".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, SyncError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_with_question_mark() -> Result<()> {
        fn inner() -> Result<i32> {
            Ok(42)
        }

        let value = inner()?;
        assert_eq!(value, 42);
        Ok(())
    }
}
