//! Configuración del proyecto
//!
//! Este módulo contiene las variables de entorno y otras configuraciones
//! del cliente.

pub mod environment;

pub use environment::*;
