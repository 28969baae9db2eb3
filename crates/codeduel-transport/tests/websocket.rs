//! Integration tests for the WebSocket transport.
//!
//! Both ends use this crate: the server side through
//! [`WebSocketTransport::accept`], the client side through
//! [`WebSocketConnection::connect`].

#[cfg(feature = "websocket")]
mod websocket {
    use std::sync::Arc;
    use std::time::Duration;

    use codeduel_transport::{
        Connection, Incoming, Transport, TransportError, WebSocketConnection,
        WebSocketTransport,
    };

    /// Binds on an OS-assigned port and returns the transport with its URL.
    async fn bind() -> (WebSocketTransport, String) {
        let transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let url = format!("ws://{}", transport.local_addr().unwrap());
        (transport, url)
    }

    /// Accepts one connection while dialling it from the client side.
    async fn pair() -> (WebSocketConnection, WebSocketConnection) {
        let (mut transport, url) = bind().await;
        let server_handle = tokio::spawn(async move {
            transport.accept().await.expect("should accept")
        });
        let client = WebSocketConnection::connect(&url)
            .await
            .expect("client should connect");
        let server = server_handle.await.expect("task should complete");
        (server, client)
    }

    #[tokio::test]
    async fn test_websocket_send_receive_both_directions() {
        let (server, client) = pair().await;
        assert_ne!(server.id(), client.id());

        server.send(b"{\"status\":\"joined\"}").await.unwrap();
        assert_eq!(
            client.recv().await.unwrap(),
            Incoming::Frame(b"{\"status\":\"joined\"}".to_vec())
        );

        client.send(b"{\"action\":\"createGame\"}").await.unwrap();
        assert_eq!(
            server.recv().await.unwrap(),
            Incoming::Frame(b"{\"action\":\"createGame\"}".to_vec())
        );
    }

    #[tokio::test]
    async fn test_websocket_recv_returns_closed_on_peer_close() {
        let (server, client) = pair().await;

        client.close().await.expect("close should succeed");

        let result = server.recv().await.expect("recv should not error");
        assert_eq!(result, Incoming::Closed);
    }

    #[tokio::test]
    async fn test_websocket_send_while_other_task_is_receiving() {
        // A reader parked in recv() must not block writes on the same
        // connection.
        let (server, client) = pair().await;
        let client = Arc::new(client);

        let reader = {
            let client = Arc::clone(&client);
            tokio::spawn(async move { client.recv().await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        tokio::time::timeout(Duration::from_secs(1), client.send(b"ping"))
            .await
            .expect("send must not wait for the reader")
            .unwrap();
        assert_eq!(
            server.recv().await.unwrap(),
            Incoming::Frame(b"ping".to_vec())
        );

        server.send(b"pong").await.unwrap();
        let received = reader.await.unwrap().unwrap();
        assert_eq!(received, Incoming::Frame(b"pong".to_vec()));
    }

    #[tokio::test]
    async fn test_websocket_connect_refused_is_connect_error() {
        // Bind, learn the port, then drop the listener so nothing answers.
        let (transport, url) = bind().await;
        drop(transport);

        let result = WebSocketConnection::connect(&url).await;
        assert!(matches!(result, Err(TransportError::ConnectFailed(_))));
    }
}
