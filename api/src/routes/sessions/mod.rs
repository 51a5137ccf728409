pub mod session_history_route;
pub mod session_messages_route;
pub mod session_model_route;
pub mod session_request;
