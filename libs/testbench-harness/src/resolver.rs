// Runtime resolution: pick the newest version of a language the service offers
use std::cmp::Ordering;

use testbench_common::types::RuntimeDescriptor;
use tracing::debug;

use crate::error::{HarnessError, Result};
use crate::executor::ExecutionService;

/// Compare two dotted version strings component by component as integers.
///
/// Missing trailing components count as 0 ("1.2" == "1.2.0"), and so does any
/// component that is not a number.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let left: Vec<u64> = a.split('.').map(version_component).collect();
    let right: Vec<u64> = b.split('.').map(version_component).collect();

    for i in 0..left.len().max(right.len()) {
        let l = left.get(i).copied().unwrap_or(0);
        let r = right.get(i).copied().unwrap_or(0);
        match l.cmp(&r) {
            Ordering::Equal => continue,
            other => return other,
        }
    }
    Ordering::Equal
}

fn version_component(part: &str) -> u64 {
    part.trim().parse().unwrap_or(0)
}

/// Highest version of `language` in `catalog`. Ties keep catalog order.
pub fn select_runtime(catalog: &[RuntimeDescriptor], language: &str) -> Option<RuntimeDescriptor> {
    let mut best: Option<&RuntimeDescriptor> = None;
    for candidate in catalog.iter().filter(|runtime| runtime.language == language) {
        match best {
            Some(current) if compare_versions(&candidate.version, &current.version) != Ordering::Greater => {}
            _ => best = Some(candidate),
        }
    }
    best.cloned()
}

/// Fetch the catalog fresh and resolve `language` against it
pub async fn resolve(service: &dyn ExecutionService, language: &str) -> Result<RuntimeDescriptor> {
    let catalog = service.runtimes().await?;
    let runtime = select_runtime(&catalog, language)
        .ok_or_else(|| HarnessError::RuntimeNotFound(language.to_string()))?;

    debug!(language, version = %runtime.version, candidates = catalog.len(), "Resolved runtime");
    Ok(runtime)
}
