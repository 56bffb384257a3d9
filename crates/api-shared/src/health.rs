use crate::wire::HealthRes;

/// Simple health service used by the REST API and its tests.
pub struct HealthService;

impl HealthService {
    /// Check health without creating an instance.
    ///
    /// # Returns
    /// A `HealthRes` indicating the service is healthy.
    pub fn check_health() -> HealthRes {
        HealthRes {
            ok: true,
            message: "LabLink is alive".into(),
        }
    }
}
