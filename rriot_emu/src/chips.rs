pub mod bits;
pub mod m6530;
