//! Translate group names into the server's permission table.

use crate::api::{EntityKind, PermissionSet, PermissionTable};
use crate::error::Result;

use super::{Creation, EntityResolver};

/// Builds `set_permissions` tables from group names.
///
/// Resolved groups get change access. View access is left empty: uploads
/// grant edit rights to the owning groups, not general visibility.
pub struct PermissionBuilder<'a> {
    groups: &'a EntityResolver,
}

impl<'a> PermissionBuilder<'a> {
    /// `groups` must resolve [`EntityKind::Group`].
    #[must_use]
    pub fn new(groups: &'a EntityResolver) -> Self {
        debug_assert_eq!(groups.kind(), EntityKind::Group);
        Self { groups }
    }

    /// Resolve every group name. Unknown groups are an error; groups are
    /// never created and never skipped.
    pub async fn build(&self, group_names: &[String]) -> Result<PermissionTable> {
        if group_names.is_empty() {
            return Ok(PermissionTable::default());
        }

        let mut ids = Vec::with_capacity(group_names.len());
        for name in group_names {
            let id = self.groups.resolve(name, false, &Creation::default()).await?;
            if !ids.contains(&id) {
                ids.push(id);
            }
        }

        log::debug!("Groups {group_names:?} resolved to {ids:?}");
        Ok(PermissionTable {
            view: PermissionSet::default(),
            change: PermissionSet {
                users: Vec::new(),
                groups: ids,
            },
        })
    }
}
