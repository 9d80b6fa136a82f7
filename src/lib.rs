pub mod catalog;
pub mod tracing;
pub mod config {
    pub mod env_loader;
    pub mod model;
}
pub mod events {
    pub mod dto;
    pub mod model;
    pub mod routes;
}
pub mod fetch {
    pub mod controller;
    pub mod state;
    pub mod view;
}
pub mod draft {
    pub mod form;
    pub mod validation;
}
pub mod repository {
    pub mod api;
    pub mod memory;
}
