pub mod cell_status;
pub mod classify;
pub mod flags;
pub mod inventory;
pub mod settings;
pub mod tracker;
pub mod traverse;
