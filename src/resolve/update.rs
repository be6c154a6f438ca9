//! One full update of a declared plugin list

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::config::ResolverConfig;
use crate::plugins;
use crate::resolve::diff::{DiffLine, diff, updated_list};
use crate::resolve::engine::resolve_plugins;
use crate::version::error::UpdateError;
use crate::version::registry::PluginSource;

/// Resolve the list at `src`, write the result to `dest` and return the diff.
///
/// `dest` is only touched once resolution has succeeded.
pub async fn update_plugins_file(
    source: Arc<dyn PluginSource>,
    config: &ResolverConfig,
    src: &Path,
    dest: &Path,
) -> Result<Vec<DiffLine>, UpdateError> {
    let requests = plugins::read(src)?.requests();
    let resolved = resolve_plugins(source, config, requests.clone()).await?;

    let updated = updated_list(&requests, &resolved);
    plugins::write(dest, &updated)?;
    info!("Wrote {} plugins to {}", updated.jenkins_plugins.len(), dest.display());

    Ok(diff(&requests, &resolved))
}
