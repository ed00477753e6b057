//! Integration test modules

mod api_routes;
mod battle_lifecycle;
