// Domain layer: models and ports. The estimator only ever sees these types.

pub mod model;
pub mod ports;
