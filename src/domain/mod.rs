// Domain layer: booking model, status policy and ports. No storage code here.

pub mod model;
pub mod policy;
pub mod ports;
