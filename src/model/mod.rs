pub mod employee;
pub mod leave_request;
pub mod request;
pub mod role;
pub mod wfh_request;
