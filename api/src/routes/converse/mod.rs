pub mod converse_request;
pub mod converse_route;
