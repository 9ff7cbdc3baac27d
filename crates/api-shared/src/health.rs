use crate::wire::HealthRes;

/// Health check shared by the REST API and the CLI.
#[derive(Clone, Default)]
pub struct HealthService;

impl HealthService {
    /// Reports the service as alive.
    ///
    /// Storage reachability is not probed here; a failing database shows up as 500s on the
    /// patient endpoints instead.
    pub fn check_health() -> HealthRes {
        HealthRes {
            ok: true,
            message: "Admissions service is alive".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_health_reports_ok() {
        let res = HealthService::check_health();
        assert!(res.ok);
        assert!(res.message.contains("alive"));
    }
}
