//! L8 post-processing: sanitary/vent-specific transforms applied to an
//! already-complete `RoutingResult`. Every other system type passes through
//! untouched.

pub mod sanitary;

pub use sanitary::postprocess_result;
