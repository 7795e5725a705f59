pub mod routes;
pub mod schema;
pub mod startup;
