pub mod calibration;
pub mod heat_load_model;
pub mod internal_gains;
