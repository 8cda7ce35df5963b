//! Provider data structure passed to resources

use crate::api::Client;
use crate::versions::{ClusterVersion, ValidationMode};
use std::sync::Arc;

#[derive(Clone)]
pub struct VastProviderData {
    pub client: Arc<Client>,
    /// Normalised version reported by the cluster at configure time
    pub cluster_version: ClusterVersion,
    pub validation_mode: ValidationMode,
}

impl VastProviderData {
    pub fn new(
        client: Client,
        cluster_version: ClusterVersion,
        validation_mode: ValidationMode,
    ) -> Self {
        Self {
            client: Arc::new(client),
            cluster_version,
            validation_mode,
        }
    }
}
