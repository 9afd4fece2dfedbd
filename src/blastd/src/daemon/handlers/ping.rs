use crate::daemon::structs::Response;

pub const PING_REQUEST: &str = "ping";

pub fn ping() -> Response {
    Response::ok()
}
