use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeskError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unknown urgency level '{value}'")]
    UnknownUrgency { value: String },

    #[error("Unknown complaint status '{value}'")]
    UnknownStatus { value: String },

    #[error("Unknown role '{value}'")]
    UnknownRole { value: String },

    #[error("Unknown history action '{value}'")]
    UnknownAction { value: String },

    #[error("Complaint '{id}' not found")]
    ComplaintNotFound { id: String },

    #[error("Tenant '{id}' not found")]
    TenantNotFound { id: String },

    #[error("User '{id}' not found")]
    UserNotFound { id: String },

    #[error("SLA config '{id}' not found")]
    SlaConfigNotFound { id: String },

    #[error("User '{user_id}' cannot be assigned complaints in tenant '{tenant_id}'")]
    InvalidAssignee { user_id: String, tenant_id: String },

    #[error("User '{user_id}' has a tenant-scoped role but no tenant")]
    MissingTenant { user_id: String },

    #[error("SLA delay must be a positive number of hours, got {hours}")]
    InvalidSlaDelay { hours: i64 },

    #[error("Timestamp {0} is out of range")]
    TimestampOutOfRange(i64),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type DeskResult<T> = Result<T, DeskError>;
