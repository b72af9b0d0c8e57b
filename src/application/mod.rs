// Application layer - Use cases over the data gateway
pub mod dashboard_store;
pub mod data_entry;
pub mod data_gateway;

#[cfg(test)]
pub mod testing;
