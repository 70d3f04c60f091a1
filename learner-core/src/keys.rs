//! JSON and property keys shared by the learner services

// Connection properties and environment variables
pub const SUNBIRD_CASSANDRA_MODE: &str = "sunbird_cassandra_mode";
pub const EMBEDDED_MODE: &str = "embedded";
pub const STANDALONE_MODE: &str = "standalone";
pub const SUNBIRD_CASSANDRA_HOST: &str = "sunbird_cassandra_host";
pub const SUNBIRD_CASSANDRA_PORT: &str = "sunbird_cassandra_port";
pub const SUNBIRD_CASSANDRA_USERNAME: &str = "sunbird_cassandra_username";
pub const SUNBIRD_CASSANDRA_PASSWORD: &str = "sunbird_cassandra_password";
pub const DB_IP: &str = "db.ip";
pub const DB_PORT: &str = "db.port";
pub const DB_USERNAME: &str = "db.username";
pub const DB_PASSWORD: &str = "db.password";
pub const DB_CONNECTION_TIMEOUT_MS: &str = "db.connection_timeout_ms";
pub const DB_EMBEDDED_CONTACT_POINT: &str = "db.embedded_contact_point";

// Dataset names
pub const LEARNER_COURSE_DB: &str = "learnerCourse";
pub const LEARNER_CONTENT_DB: &str = "learnerContent";
pub const COURSE_MANAGEMENT_DB: &str = "courseManagement";
pub const PAGE_MGMT_DB: &str = "pageMgmt";
pub const PAGE_SECTION_DB: &str = "pageSection";
pub const SECTION_MGMT_DB: &str = "sectionMgmt";
pub const ASSESSMENT_EVAL_DB: &str = "assessmentEval";
pub const ASSESSMENT_ITEM_DB: &str = "assessmentItem";
pub const BULK_OP_DB: &str = "bulkOp";
pub const COURSE_BATCH_DB: &str = "courseBatch";
pub const CLIENT_INFO_DB: &str = "clientInfo";
pub const USER_AUTH_DB: &str = "userAuth";
pub const CONTENT_BADGE_ASSOCIATION_DB: &str = "contentBadgeAssociation";
pub const COURSE_DIALCODES_DB: &str = "courseDialcodes";

// Search payload
pub const QUERY: &str = "query";
pub const QUERY_FIELDS: &str = "queryFields";
pub const FACETS: &str = "facets";
pub const FIELDS: &str = "fields";
pub const FILTERS: &str = "filters";
pub const EXISTS: &str = "exists";
pub const NOT_EXISTS: &str = "not_exists";
pub const SORT_BY: &str = "sort_by";
pub const OFFSET: &str = "offset";
pub const LIMIT: &str = "limit";
pub const GROUP_QUERY: &str = "groupQuery";
pub const SOFT_CONSTRAINTS: &str = "softConstraints";

// Request telemetry context
pub const TELEMETRY_CONTEXT: &str = "telemetryContext";
pub const CHANNEL: &str = "channel";
pub const ACTOR_ID: &str = "actorId";
pub const ACTOR_TYPE: &str = "actorType";
pub const APP_ID: &str = "appId";
pub const ENV: &str = "env";
pub const REQUEST_TYPE: &str = "requestType";
pub const REQUEST_ID: &str = "requestId";
pub const DEVICE_ID: &str = "did";
pub const ROLLUP: &str = "rollup";
pub const REQUESTED_BY: &str = "requestedBy";
pub const ROOT_ORG_ID: &str = "rootOrgId";
pub const API_CALL: &str = "API_CALL";
pub const USER: &str = "user";
