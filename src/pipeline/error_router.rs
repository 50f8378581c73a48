//! Forward-only lookup of the next eligible error handler.

use std::sync::Arc;

use crate::pipeline::handler::ErrorHandler;
use crate::routing::matcher::Params;
use crate::routing::table::Entry;

/// The first error handler at or after `from` whose scope contains `path`,
/// with its position and scope params. Entries before `from` are never consulted.
pub fn next_error_handler<'a>(
    entries: &'a [Entry],
    from: usize,
    path: &str,
) -> Option<(usize, &'a Arc<dyn ErrorHandler>, Params)> {
    entries
        .iter()
        .enumerate()
        .skip(from)
        .find_map(|(index, entry)| {
            entry
                .error_handler_for(path)
                .map(|(handler, params)| (index, handler, params))
        })
}
