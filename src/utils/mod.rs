pub mod booking_rules;
pub mod jwt;
pub mod password;
pub mod validation;
