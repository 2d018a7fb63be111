//! Shared helpers and macros for Diesel repository implementations.

use crate::domain::PageRequest;

/// `(limit, offset)` for a page request in the types Diesel expects.
pub(super) fn page_window(page: &PageRequest) -> (i64, i64) {
    (i64::from(page.limit()), i64::from(page.offset()))
}

/// Batch size for a cron sweep.
pub(super) fn batch_limit(limit: u32) -> i64 {
    i64::from(limit)
}

/// Declare `pool_error`, `diesel_error` and `decode_error` for a repository
/// whose port error has `connection` and `query` constructors.
macro_rules! repository_error_mapping {
    ($error:ty) => {
        fn pool_error(error: $crate::outbound::persistence::pool::PoolError) -> $error {
            $crate::outbound::persistence::error_mapping::map_pool_error(
                error,
                <$error>::connection,
            )
        }

        fn diesel_error(error: ::diesel::result::Error) -> $error {
            $crate::outbound::persistence::error_mapping::map_diesel_error(
                error,
                <$error>::query,
                <$error>::connection,
            )
        }

        #[allow(dead_code, reason = "not every repository decodes rows")]
        fn decode_error(error: $crate::outbound::persistence::models::RowDecodeError) -> $error {
            $crate::outbound::persistence::error_mapping::map_decode_error(error, <$error>::query)
        }
    };
}

pub(super) use repository_error_mapping;
