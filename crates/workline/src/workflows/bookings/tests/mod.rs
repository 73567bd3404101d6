mod common;

mod payments;
mod service;
