use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::time::{timeout, Duration};

use crate::protocol::codec::truncate_reason;
use crate::protocol::{
    decode_body, decode_header, encode, Packet, PeerRole, ProtocolError, HEADER_LEN,
};
use crate::transport::Stream;

/// A framed packet connection over a duplex byte stream.
///
/// The connection owns its stream. Once [`disconnect`](Self::disconnect) has
/// run, or a write has failed, nothing more is ever sent. After a read timeout
/// the incoming framing is lost: receiving and sending game packets both fail
/// with `ConnectionClosed`, and only the disconnect notice may still go out.
pub struct Connection<S> {
    role: PeerRole,
    stream: S,
    disconnected: bool,
    broken: bool,
    timed_out: bool,
    read_timeout: Option<Duration>,
}

impl<S: Stream> Connection<S> {
    pub fn new(role: PeerRole, stream: S) -> Self {
        Self {
            role,
            stream,
            disconnected: false,
            broken: false,
            timed_out: false,
            read_timeout: None,
        }
    }

    /// Bound how long [`receive`](Self::receive) waits for one whole packet.
    /// `None` waits forever.
    pub fn with_read_timeout(mut self, read_timeout: Option<Duration>) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    pub fn set_read_timeout(&mut self, read_timeout: Option<Duration>) {
        self.read_timeout = read_timeout;
    }

    pub fn role(&self) -> PeerRole {
        self.role
    }

    /// Returns `true` once a disconnect has been sent.
    pub fn is_disconnected(&self) -> bool {
        self.disconnected
    }

    pub fn into_inner(self) -> S {
        self.stream
    }

    /// Encode `packet` and write the whole frame.
    pub async fn send(&mut self, packet: &Packet) -> Result<(), ProtocolError> {
        if self.disconnected || self.timed_out {
            return Err(ProtocolError::ConnectionClosed);
        }
        self.write_packet(packet).await
    }

    async fn write_packet(&mut self, packet: &Packet) -> Result<(), ProtocolError> {
        if self.broken {
            return Err(ProtocolError::ConnectionClosed);
        }
        let frame = encode(packet);
        let written = async {
            self.stream.write_all(&frame).await?;
            self.stream.flush().await
        }
        .await;
        if let Err(e) = written {
            self.broken = true;
            return Err(e.into());
        }
        log::trace!("[{}] sent {} ({} bytes)", self.role, packet.packet_type(), frame.len());
        Ok(())
    }

    /// Read and decode the next frame, honouring the read timeout.
    pub async fn receive(&mut self) -> Result<Packet, ProtocolError> {
        if self.broken || self.timed_out {
            return Err(ProtocolError::ConnectionClosed);
        }
        let Some(limit) = self.read_timeout else {
            return self.read_frame().await;
        };
        match timeout(limit, self.read_frame()).await {
            Ok(result) => result,
            Err(_) => {
                // Part of a frame may already have been consumed.
                self.timed_out = true;
                Err(ProtocolError::Timeout(limit))
            }
        }
    }

    async fn read_frame(&mut self) -> Result<Packet, ProtocolError> {
        let mut header_buf = [0u8; HEADER_LEN];
        let got = self.read_full(&mut header_buf).await?;
        if got < HEADER_LEN {
            log::debug!("[{}] stream closed after {} header bytes", self.role, got);
            return Err(ProtocolError::ConnectionClosed);
        }
        let header = decode_header(&header_buf)?;

        let expected = header.length as usize;
        let mut body = vec![0u8; expected];
        let got = self.read_full(&mut body).await?;
        if got < expected {
            return Err(ProtocolError::TruncatedBody {
                received: got,
                expected,
            });
        }

        let packet = decode_body(header, &body)?;
        log::trace!("[{}] received {} ({} byte body)", self.role, header.packet_type, expected);
        Ok(packet)
    }

    /// Fill `buf` from the stream, returning how many bytes arrived before
    /// end of stream.
    async fn read_full(&mut self, buf: &mut [u8]) -> Result<usize, ProtocolError> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.stream.read(&mut buf[filled..]).await {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) => {
                    self.broken = true;
                    return Err(e.into());
                }
            }
        }
        Ok(filled)
    }

    /// Tell the peer why we are leaving, then stop sending for good.
    ///
    /// Does nothing if a disconnect was already sent. Failure to deliver the
    /// notice is logged and otherwise ignored.
    pub async fn disconnect(&mut self, reason: &str) {
        if self.disconnected {
            return;
        }
        let reason = truncate_reason(reason);
        log::warn!("[{}] disconnecting peer: {}", self.role, reason);

        let notice = Packet::Disconnect {
            reason: reason.to_string(),
        };
        if let Err(e) = self.write_packet(&notice).await {
            log::debug!("[{}] could not deliver disconnect: {}", self.role, e);
        }
        self.disconnected = true;
        if let Err(e) = self.stream.shutdown().await {
            log::debug!("[{}] shutdown failed: {}", self.role, e);
        }
    }
}
