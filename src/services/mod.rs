pub mod alerts;
pub mod allocation;
pub mod analytics;
pub mod availability;
pub mod batches;
pub mod consumption;
pub mod fefo;
pub mod items;
pub mod locks;
