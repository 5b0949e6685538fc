//! Output of the `tags list` and `correspondents list` commands.

use std::collections::BTreeMap;

use crate::api::EntityId;

/// How a name listing is printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListFormat {
    /// Separate entries with NUL instead of newlines.
    pub zero: bool,
    /// Append `<TAB>id` to every name.
    pub ids: bool,
}

impl ListFormat {
    fn delimiter(self) -> &'static str {
        if self.zero {
            "\0"
        } else {
            "\n"
        }
    }
}

/// Join the entries of `names` (already sorted by name) with the delimiter
/// chosen by `format`. There is no trailing delimiter.
#[must_use]
pub fn format_listing(names: &BTreeMap<String, EntityId>, format: ListFormat) -> String {
    names
        .iter()
        .map(|(name, id)| {
            if format.ids {
                format!("{name}\t{id}")
            } else {
                name.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(format.delimiter())
}
