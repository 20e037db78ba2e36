pub mod boot;
pub mod create;
pub mod serve;
pub mod status;
pub mod stop;
