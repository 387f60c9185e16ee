pub mod maps;
pub mod mods;
pub mod ratings;
pub mod reference;
pub mod submit_map;
pub mod submit_mod;
