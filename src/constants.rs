/// Request metadata entry carrying the calling user's id
pub const USER_ID_METADATA_KEY: &str = "x-user-id";
