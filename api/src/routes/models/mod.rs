pub mod list_models_route;
pub mod models_response;
pub mod ollama_models_route;
