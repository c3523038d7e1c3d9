pub mod auth;
pub mod checkout;
pub mod feedback;
pub mod health;
pub mod orders;
pub mod print_jobs;
pub mod products;
pub mod rate_limit;
pub mod settings;
pub mod staff_orders;
