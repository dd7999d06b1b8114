//! Scripted player endpoint.

use std::{io, net::SocketAddr, time::Duration};

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use remotewire::{
    codec::EnvelopeCodec,
    message::{Envelope, Message, WireFormat},
    session::ConnectionSession,
};
use tokio::{
    io::AsyncWriteExt,
    net::{TcpListener, TcpStream},
    time::timeout,
};
use tokio_util::codec::Framed;

/// How long [`PlayerPeer::recv`] waits before giving up.
pub const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// Listening side of a fake player.
pub struct MockPlayer {
    listener: TcpListener,
    addr: SocketAddr,
}

impl MockPlayer {
    /// Bind to an ephemeral loop-back port.
    ///
    /// # Errors
    ///
    /// Returns any error from binding the listener.
    pub async fn bind() -> io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        Ok(Self { listener, addr })
    }

    #[must_use]
    pub fn addr(&self) -> SocketAddr { self.addr }

    /// Session profile pointing at this player.
    #[must_use]
    pub fn session(&self, name: &str) -> ConnectionSession {
        ConnectionSession::new(name, self.addr.ip().to_string(), self.addr.port())
    }

    /// Wait for the remote to connect.
    ///
    /// # Errors
    ///
    /// Returns any error from accepting the connection.
    pub async fn accept(&self) -> io::Result<PlayerPeer> {
        let (stream, _) = self.listener.accept().await?;
        Ok(PlayerPeer {
            framed: Framed::new(stream, EnvelopeCodec::default()),
        })
    }
}

/// One accepted remote connection.
pub struct PlayerPeer {
    framed: Framed<TcpStream, EnvelopeCodec>,
}

impl PlayerPeer {
    /// Send `message` in a versioned envelope.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or writing fails.
    pub async fn send(&mut self, message: Message) -> io::Result<()> {
        let payload = Envelope::new(message)
            .to_bytes()
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
        self.framed
            .send(Bytes::from(payload))
            .await
            .map_err(io::Error::from)
    }

    /// Send every message of `messages` in order.
    ///
    /// # Errors
    ///
    /// Returns the first error from [`PlayerPeer::send`].
    pub async fn send_all(&mut self, messages: impl IntoIterator<Item = Message>) -> io::Result<()> {
        for message in messages {
            self.send(message).await?;
        }
        Ok(())
    }

    /// Write bytes straight to the socket, bypassing the codec.
    ///
    /// # Errors
    ///
    /// Returns any error from writing.
    pub async fn send_raw(&mut self, bytes: &[u8]) -> io::Result<()> {
        SinkExt::<Bytes>::flush(&mut self.framed)
            .await
            .map_err(io::Error::from)?;
        let stream = self.framed.get_mut();
        stream.write_all(bytes).await?;
        stream.flush().await
    }

    /// Next message from the remote, or `None` once it closed the socket.
    ///
    /// # Errors
    ///
    /// Returns an error on a framing or decode failure, or after
    /// [`RECV_TIMEOUT`].
    pub async fn recv(&mut self) -> io::Result<Option<Message>> {
        let next = timeout(RECV_TIMEOUT, self.framed.next())
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "no message from remote"))?;
        match next {
            None => Ok(None),
            Some(Err(err)) => Err(err.into()),
            Some(Ok(payload)) => Envelope::from_bytes(&payload)
                .map(|envelope| Some(envelope.message))
                .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err)),
        }
    }

    /// Whether the remote closed the connection within [`RECV_TIMEOUT`].
    ///
    /// Messages arriving before the close are discarded.
    pub async fn closed(&mut self) -> bool {
        loop {
            match self.recv().await {
                Ok(None) => return true,
                Ok(Some(_)) => {}
                Err(err) => return err.kind() != io::ErrorKind::TimedOut,
            }
        }
    }
}
