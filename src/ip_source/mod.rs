pub mod ip_source;
pub mod mydns;
