pub mod admin;
pub mod airline;
pub mod airplane;
pub mod airport;
pub mod booking;
pub mod city;
pub mod country;
pub mod flight;
pub mod passenger;
pub mod payment;
pub mod user;
