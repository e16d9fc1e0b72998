//! 基础设施层
//!
//! 只提供 HTTP 能力，不认识题目和评分

pub mod http;

pub use http::{build_http_client, check_status, map_reqwest_error, parse_retry_after, status_to_error};
