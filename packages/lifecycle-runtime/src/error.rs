use lifecycle_core::LifecycleOperation;

/// Errors returned by the service registry and configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("service already registered: {name}")]
    DuplicateService { name: String },
    #[error("unknown service: {name}")]
    UnknownService { name: String },
    /// A lifecycle hook failed. `source` is the hook's own error.
    #[error("failed to {operation} service {service}")]
    Lifecycle {
        service: String,
        operation: LifecycleOperation,
        #[source]
        source: anyhow::Error,
    },
    #[error("failed to read configuration: {0}")]
    ConfigRead(#[from] std::io::Error),
    #[error("invalid configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

impl RegistryError {
    pub(crate) fn lifecycle(
        service: impl Into<String>,
        operation: LifecycleOperation,
        source: anyhow::Error,
    ) -> Self {
        Self::Lifecycle {
            service: service.into(),
            operation,
            source,
        }
    }

    /// The hook error behind a `Lifecycle` failure.
    #[must_use]
    pub fn hook_error(&self) -> Option<&anyhow::Error> {
        match self {
            Self::Lifecycle { source, .. } => Some(source),
            _ => None,
        }
    }
}
