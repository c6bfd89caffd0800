//! Log group lookup.

use tracing::debug;

use crate::error::{ReaderError, Result, MAX_GROUP_SUGGESTIONS};
use crate::service::{ListGroupsRequest, LogService};
use crate::types::LogGroup;

/// Lists every group whose name starts with `prefix`, following all pages.
///
/// # Errors
///
/// Returns [`ReaderError::Upstream`] if any page fails.
pub async fn list_groups<S: LogService>(service: &S, prefix: &str) -> Result<Vec<LogGroup>> {
    let mut request = ListGroupsRequest::new(prefix);
    let mut groups = Vec::new();

    loop {
        let page = service.list_groups(request.clone()).await?;
        groups.extend(page.items.into_iter().map(LogGroup::from));
        match page.next_token {
            Some(token) => request.next_token = Some(token),
            None => break,
        }
    }

    Ok(groups)
}

/// Finds the group named exactly `name`.
///
/// # Errors
///
/// - [`ReaderError::GroupNotFound`] if no group starts with `name`
/// - [`ReaderError::AmbiguousGroup`] if groups start with `name` but none is
///   named exactly `name`; carries the first five in store order
/// - [`ReaderError::Upstream`] if the store fails
pub async fn resolve_group<S: LogService>(service: &S, name: &str) -> Result<LogGroup> {
    let mut groups = list_groups(service, name).await?;

    if groups.is_empty() {
        debug!(group = name, "no group matches");
        return Err(ReaderError::GroupNotFound {
            name: name.to_string(),
        });
    }

    let candidates = groups.len();
    if let Some(ix) = groups.iter().position(|g| g.name == name) {
        debug!(group = name, candidates, "resolved group");
        return Ok(groups.swap_remove(ix));
    }

    debug!(group = name, candidates, "group name is ambiguous");
    Err(ReaderError::AmbiguousGroup {
        name: name.to_string(),
        suggestions: groups
            .into_iter()
            .take(MAX_GROUP_SUGGESTIONS)
            .map(|g| g.name)
            .collect(),
    })
}
