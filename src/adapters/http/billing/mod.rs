mod handlers;
mod routes;

pub use routes::webhook_routes;
