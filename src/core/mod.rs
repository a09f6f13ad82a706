pub mod clustering;
pub mod reduction;
pub mod solvers;
pub mod space_heat_demand;
pub mod units;
