mod dto;
mod handlers;
mod routes;

pub use routes::auth_routes;
