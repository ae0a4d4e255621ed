//! HTTP plumbing for the two remote position sources: the bulk element
//! catalog (plain text) and the live single-fix endpoint (JSON).

pub mod catalog_get;
pub mod http_client;
pub mod live_fix_get;
pub mod request_common;
pub mod response_common;
