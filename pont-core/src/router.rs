//! # Method Router
//!
//! Maps a gRPC-Web request path (`/habits.HabitService/CreateHabit`) to one of the
//! statically known [`HabitMethod`]s.
//!
//! The method set is closed: adding an RPC means adding a [`HabitMethod`] variant and its
//! arm in [`crate::executor::CallExecutor::execute`]. Nothing is resolved by reflection at
//! request time.
use std::collections::HashMap;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RouteError {
    #[error("Path '{0}' does not belong to service '{1}'")]
    OutsideNamespace(String, String),
    #[error("Unknown method '{0}'")]
    UnknownMethod(String),
}

/// The unary RPCs exposed by `habits.HabitService`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HabitMethod {
    CreateHabit,
    GetAllHabits,
    LogHabitCompletion,
    GetHabitHistory,
}

impl HabitMethod {
    pub const ALL: [HabitMethod; 4] = [
        HabitMethod::CreateHabit,
        HabitMethod::GetAllHabits,
        HabitMethod::LogHabitCompletion,
        HabitMethod::GetHabitHistory,
    ];

    /// The method name as it appears in the last segment of the request path.
    pub fn name(self) -> &'static str {
        match self {
            HabitMethod::CreateHabit => "CreateHabit",
            HabitMethod::GetAllHabits => "GetAllHabits",
            HabitMethod::LogHabitCompletion => "LogHabitCompletion",
            HabitMethod::GetHabitHistory => "GetHabitHistory",
        }
    }
}

/// Resolves request paths of a single service namespace.
///
/// Built once at startup and shared read-only between requests.
#[derive(Debug, Clone)]
pub struct MethodRouter {
    prefix: String,
    methods: HashMap<&'static str, HabitMethod>,
}

impl MethodRouter {
    /// Creates a router for the service with the given fully qualified name
    /// (e.g. `habits.HabitService`).
    pub fn new(service: &str) -> Self {
        let methods = HabitMethod::ALL
            .into_iter()
            .map(|method| (method.name(), method))
            .collect();

        Self {
            prefix: format!("/{service}/"),
            methods,
        }
    }

    /// Returns `true` when `path` is inside the service namespace, known method or not.
    pub fn handles(&self, path: &str) -> bool {
        path.starts_with(&self.prefix)
    }

    /// Resolves the trailing path segment to a [`HabitMethod`].
    pub fn route(&self, path: &str) -> Result<HabitMethod, RouteError> {
        let rest = path.strip_prefix(&self.prefix).ok_or_else(|| {
            RouteError::OutsideNamespace(path.to_string(), self.prefix.trim_matches('/').into())
        })?;

        let name = rest.rsplit('/').next().unwrap_or(rest);

        self.methods
            .get(name)
            .copied()
            .ok_or_else(|| RouteError::UnknownMethod(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router() -> MethodRouter {
        MethodRouter::new("habits.HabitService")
    }

    #[test]
    fn test_routes_every_known_method() {
        let router = router();

        for method in HabitMethod::ALL {
            let path = format!("/habits.HabitService/{}", method.name());
            assert_eq!(router.route(&path), Ok(method));
        }
    }

    #[test]
    fn test_unknown_method() {
        assert_eq!(
            router().route("/habits.HabitService/DeleteHabit"),
            Err(RouteError::UnknownMethod("DeleteHabit".to_string()))
        );
        assert_eq!(
            router().route("/habits.HabitService/"),
            Err(RouteError::UnknownMethod(String::new()))
        );
    }

    #[test]
    fn test_method_names_are_case_sensitive() {
        assert!(router().route("/habits.HabitService/createHabit").is_err());
    }

    #[test]
    fn test_namespace() {
        let router = router();

        assert!(router.handles("/habits.HabitService/CreateHabit"));
        assert!(router.handles("/habits.HabitService/Anything"));
        assert!(!router.handles("/habits.HabitServiceV2/CreateHabit"));
        assert!(!router.handles("/index.html"));

        assert_eq!(
            router.route("/other.Service/CreateHabit"),
            Err(RouteError::OutsideNamespace(
                "/other.Service/CreateHabit".to_string(),
                "habits.HabitService".to_string()
            ))
        );
    }

    #[test]
    fn test_trailing_segment_is_the_method() {
        assert_eq!(
            router().route("/habits.HabitService/nested/GetAllHabits"),
            Ok(HabitMethod::GetAllHabits)
        );
    }
}
