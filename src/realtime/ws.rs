use actix_session::Session;
use actix_web::web::Bytes;
use actix_web::{HttpRequest, HttpResponse, web};
use actix_ws::Message;
use tokio::sync::broadcast::error::RecvError;

use crate::auth::session::get_identity;
use crate::state::AppState;

#[derive(Debug, PartialEq)]
enum ClientFrame {
    Ping(Bytes),
    Ignore,
    /// Close frame, protocol error or end of stream.
    Closed,
}

fn client_frame<E>(msg: Option<Result<Message, E>>) -> ClientFrame {
    match msg {
        Some(Ok(Message::Ping(bytes))) => ClientFrame::Ping(bytes),
        Some(Ok(Message::Close(_))) | Some(Err(_)) | None => ClientFrame::Closed,
        Some(Ok(_)) => ClientFrame::Ignore,
    }
}

/// Upgrade to a WebSocket that pushes `{"type":"refetch","table":...}` on every
/// store change. Clients refetch over HTTP; nothing is accepted over the socket.
pub async fn ws_connect(
    req: HttpRequest,
    body: web::Payload,
    session: Session,
    state: web::Data<AppState>,
) -> Result<HttpResponse, actix_web::Error> {
    let identity = match get_identity(&session)? {
        Some(identity) => identity,
        None => return Ok(HttpResponse::Unauthorized().finish()),
    };

    let (response, mut ws_session, mut msg_stream) = actix_ws::handle(&req, body)?;
    let mut changes = state.store.changes().subscribe();
    log::debug!("Change socket opened for {}", identity.actor_label());

    actix_web::rt::spawn(async move {
        loop {
            tokio::select! {
                change = changes.recv() => {
                    let table = match change {
                        Ok(change) => change.table.as_str(),
                        // Missed changes: ask for everything.
                        Err(RecvError::Lagged(_)) => "all",
                        Err(RecvError::Closed) => break,
                    };
                    let msg = serde_json::json!({ "type": "refetch", "table": table });
                    if ws_session.text(msg.to_string()).await.is_err() {
                        break;
                    }
                }
                msg = msg_stream.recv() => {
                    match client_frame(msg) {
                        ClientFrame::Ping(bytes) => {
                            if ws_session.pong(&bytes).await.is_err() {
                                break;
                            }
                        }
                        ClientFrame::Ignore => {}
                        ClientFrame::Closed => break,
                    }
                }
            }
        }
        let _ = ws_session.close(None).await;
        log::debug!("Change socket closed for {}", identity.actor_label());
    });

    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disconnect_closes_the_socket() {
        assert_eq!(client_frame::<()>(None), ClientFrame::Closed);
        assert_eq!(client_frame(Some(Err(()))), ClientFrame::Closed);
        assert_eq!(client_frame::<()>(Some(Ok(Message::Close(None)))), ClientFrame::Closed);
    }

    #[test]
    fn pings_are_answered_and_text_ignored() {
        let ping = Bytes::from_static(b"hb");
        assert_eq!(client_frame::<()>(Some(Ok(Message::Ping(ping.clone())))), ClientFrame::Ping(ping));
        assert_eq!(client_frame::<()>(Some(Ok(Message::Text("hi".into())))), ClientFrame::Ignore);
    }
}
