pub mod compile;
pub mod inspect;
pub mod serve;
pub mod stdio;
pub mod validate;
