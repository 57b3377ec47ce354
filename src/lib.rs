#![allow(clippy::too_many_arguments)]
#![allow(clippy::type_complexity)]

pub mod app;
pub mod components;
pub mod io;
pub mod logger;
pub mod ops;
pub mod registry;
pub mod session;
pub mod settings;
pub mod svg;
