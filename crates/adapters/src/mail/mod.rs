//! Mail sender adapters

mod http;
mod log;
#[cfg(test)]
mod stub;

pub use http::HttpMailSender;
pub use log::LogMailSender;
