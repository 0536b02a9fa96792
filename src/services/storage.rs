use serde::Serialize;
use std::path::Path;
use sysinfo::{DiskExt, System, SystemExt};

/// A mounted volume and its capacity.
#[derive(Debug, Clone, Serialize)]
pub struct Volume {
    pub name: String,
    pub mount_point: String,
    pub total_capacity: u64,
    pub available_capacity: u64,
    pub is_removable: bool,
}

/// Snapshot of the currently mounted volumes.
pub fn volumes() -> Vec<Volume> {
    System::new_all()
        .disks()
        .iter()
        .map(|disk| Volume {
            name: disk.name().to_str().unwrap_or("Volume").to_string(),
            mount_point: disk.mount_point().to_string_lossy().to_string(),
            total_capacity: disk.total_space(),
            available_capacity: disk.available_space(),
            is_removable: disk.is_removable(),
        })
        .collect()
}

/// Bytes available on the volume holding `path`, chosen by the longest
/// mount-point prefix. `None` when no mounted volume contains the path.
pub fn available_space(path: &Path) -> Option<u64> {
    let location = path.to_string_lossy().to_string();
    volumes()
        .into_iter()
        .filter(|volume| location.starts_with(&volume.mount_point))
        .max_by_key(|volume| volume.mount_point.len())
        .map(|volume| volume.available_capacity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volume_listing_smoke() {
        // Can't assert anything about the host's disks; the calls just must
        // not panic and must agree with each other.
        let volumes = volumes();
        let root_space = available_space(Path::new("/"));
        if volumes.iter().any(|v| v.mount_point == "/") {
            assert!(root_space.is_some());
        }
    }
}
