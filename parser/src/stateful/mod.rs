//! Stateful decoding and encoding abstractions,
//! which hold the data source or destination
//! together with the codecs that the transfer syntax
//! and character set call for.
pub mod decode;
pub mod encode;
