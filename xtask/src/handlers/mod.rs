pub mod build;
pub mod clear;
pub mod license;
pub mod lint;
pub mod upver;
