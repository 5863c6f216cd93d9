// Stable error codes surfaced to API clients and operators

pub mod validation {
    pub const INVALID_INPUT: &str = "VALIDATION_1001";
}

pub mod authentication {
    pub const SESSION_MISSING: &str = "AUTH_2001";
}

pub mod authorization {
    pub const ACCESS_DENIED: &str = "AUTHZ_3001";
}

pub mod server {
    pub const PERSISTENCE_FAILED: &str = "DB_4002";
    pub const INTERNAL: &str = "SERVER_5000";
}

pub mod not_found {
    pub const RESOURCE_NOT_FOUND: &str = "NOTFOUND_6001";
}
