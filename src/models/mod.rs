//! Modelos de datos
//!
//! Este módulo contiene los modelos que maneja el cliente: vehículos,
//! historiales, estado de cumplimiento e idioma.

pub mod history;
pub mod locale;
pub mod status;
pub mod vehicle;

pub use history::*;
pub use locale::Locale;
pub use status::*;
pub use vehicle::*;
