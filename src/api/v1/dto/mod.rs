pub mod login_request;
pub mod principal;
pub mod token_response;
