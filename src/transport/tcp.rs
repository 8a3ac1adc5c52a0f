use std::net::SocketAddr;

use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};

use crate::protocol::PeerRole;
use crate::transport::Connection;

impl Connection<TcpStream> {
    /// Connect to a hosting peer and play as the client.
    pub async fn connect<A: ToSocketAddrs>(addr: A) -> anyhow::Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        stream.set_nodelay(true)?;
        Ok(Self::new(PeerRole::Client, stream))
    }

    /// Accept one peer from `listener` and play as the server.
    pub async fn accept(listener: &TcpListener) -> anyhow::Result<(Self, SocketAddr)> {
        let (stream, addr) = listener.accept().await?;
        stream.set_nodelay(true)?;
        Ok((Self::new(PeerRole::Server, stream), addr))
    }
}
