use tokio::io::{AsyncRead, AsyncWrite};

pub mod connection;
pub mod in_memory;
pub mod tcp;

pub use connection::Connection;

/// Any duplex byte stream a [`Connection`] can own.
pub trait Stream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> Stream for T {}
