pub mod fields {
    pub const TASK_ID: &str = "task_id";
    pub const STATUS: &str = "status";
    pub const RESULT_URL: &str = "result_url";
    pub const RESULT: &str = "result";
}

pub mod job_types {
    pub const RENDER: &str = "jpeg";
    pub const MT_STATS: &str = "mt_stats";
}

pub mod indices {
    pub const NDVI: &str = "NDVI";
    pub const SOIL_MOISTURE: &str = "SOIL_MOISTURE";
}

pub mod routes {
    pub const HEALTH: &str = "/health";

    pub const NDVI_IMAGE: &str = "/api/ndvi-image";
    pub const VEGETATION_STATS: &str = "/api/vegetation-stats";
    pub const SOIL_MOISTURE: &str = "/api/soil-moisture";

    /// Placeholder substituted with the job handle in status endpoint templates.
    pub const TASK_ID_PLACEHOLDER: &str = "{task_id}";

    pub const UPSTREAM_CREATE: &str = "/api/gdw/api";
    pub const UPSTREAM_STATUS: &str = "/api/gdw/api/{task_id}";
}
