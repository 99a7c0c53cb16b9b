use std::env::var;

use futures::StreamExt;
use relay_gateway::{spawn, FrameAdapter, GatewaySettings, GATEWAY_URL};
use relay_model::DispatchEvent;
use tokio_tungstenite::connect_async;

#[tokio::main]
async fn main() {
    env_logger::init();

    let token = var("DISCORD_TOKEN").expect("no DISCORD_TOKEN provided");
    let settings = GatewaySettings::new(token, (0, 1));

    let (ws, _) = connect_async(GATEWAY_URL).await.expect("failed to connect to the gateway");
    let (transport_out, transport_in) = ws.split();
    let inbound = FrameAdapter::new(transport_in, settings.log_received_ws);

    let (dispatch_tx, mut dispatch_rx) = futures::channel::mpsc::unbounded();
    tokio::spawn(async move {
        while let Some(msg) = dispatch_rx.next().await {
            if let relay_model::GatewayMessage::Dispatch { event: DispatchEvent::Other(value), .. } = msg {
                println!("dispatch: {value}");
            }
        }
    });

    let session = spawn(inbound, transport_out, dispatch_tx, settings, None);

    match session.outcome.await {
        Ok(outcome) => println!("session ended cleanly, resumable: {}", outcome.resume.is_some()),
        Err(err) => eprintln!("session ended with an error: {err}"),
    }
}
