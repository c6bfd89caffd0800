//! CLI command implementations.
//!
//! Each submodule implements a specific CLI command:
//! - [`get`] - Fetch or follow events of a group
//! - [`list`] - List groups and streams

pub mod get;
pub mod list;

use std::path::Path;
use std::sync::Arc;

use tracing::debug;
use trawl_core::MemoryLogService;

use crate::error::{CliError, Result};

pub use get::GetCommand;
pub use list::ListCommand;

/// Loads the log store the commands read from.
///
/// # Errors
///
/// Returns [`CliError::Usage`] if no fixture is configured, or a reader
/// error if the fixture cannot be read or parsed.
pub fn open_store(fixture: Option<&Path>) -> Result<Arc<MemoryLogService>> {
    let path = fixture.ok_or_else(|| {
        CliError::Usage("no log store configured: pass --fixture or set TRAWL_FIXTURE".into())
    })?;
    let service = MemoryLogService::from_fixture(path)?;
    debug!(path = %path.display(), "loaded log store");
    Ok(Arc::new(service))
}
