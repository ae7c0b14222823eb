// Users domain - read-only projection of the external identity subsystem

pub mod models;
