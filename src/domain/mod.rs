// Domain layer: core models, pure services and ports (interfaces).

pub mod model;
pub mod ports;
pub mod services;
