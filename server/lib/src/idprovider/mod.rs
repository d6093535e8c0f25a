pub mod interface;
pub mod usos;
