use crate::wire::HealthRes;

/// Simple health service shared by the REST server and any future transport.
///
/// This service provides a standardised way to check the health status of the contacts
/// service. It holds no state.
#[derive(Clone, Debug, Default)]
pub struct HealthService;

impl HealthService {
    /// Check health without creating an instance.
    ///
    /// # Returns
    /// A `HealthRes` indicating the service is healthy.
    pub fn check_health() -> HealthRes {
        HealthRes {
            ok: true,
            message: "Contacts API is alive".into(),
        }
    }
}
