pub mod payment_methods;
