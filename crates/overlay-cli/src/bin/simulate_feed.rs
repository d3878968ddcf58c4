//! Local position feed for exercising the overlay without the live service.
//!
//! Serves the feed's websocket framing and streams one entity driving in a
//! circle, optionally interleaved with a decoy entity.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use futures_util::{SinkExt, StreamExt};
use overlay_cli::auth::{is_authorized, presented_token};
use overlay_cli::sim::{
    observation_payload, update_period, CircularPath, PayloadStyle, TrackPath,
};
use overlay_feed::Envelope;
use tokio::net::{TcpListener, TcpStream};
use tokio::time;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::http::StatusCode;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

/// Serve a simulated position feed (single entity, circular track)
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:9000")]
    bind: SocketAddr,

    /// Token clients must present; any client is accepted when unset
    #[arg(long)]
    token: Option<String>,

    /// Room clients join
    #[arg(long, default_value = "behaviorstate")]
    room: String,

    /// Tracked entity identifier
    #[arg(long, default_value = "543DF7")]
    entity: String,

    /// Center latitude
    #[arg(long, default_value_t = 42.3012213)]
    lat: f64,

    /// Center longitude
    #[arg(long, default_value_t = -83.6967968)]
    lon: f64,

    /// Circle radius in meters
    #[arg(long, default_value_t = 40.0)]
    radius: f64,

    /// Speed in meters per second
    #[arg(long, default_value_t = 5.0)]
    speed: f64,

    /// Update rate in Hz (at most 100)
    #[arg(long, default_value_t = 2.0)]
    rate: f64,

    /// Duration per client in seconds
    #[arg(long, default_value_t = 120)]
    duration: u64,

    /// Interleave messages for another entity
    #[arg(long)]
    decoy: bool,

    /// Send payloads as serialized JSON strings
    #[arg(long)]
    string_payloads: bool,

    /// Leave out the Heading field
    #[arg(long)]
    omit_heading: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Arc::new(Args::parse());
    let period = update_period(args.rate).context("Invalid --rate")?;

    let listener = TcpListener::bind(args.bind)
        .await
        .with_context(|| format!("Failed to bind {}", args.bind))?;

    println!("Simulated feed listening on ws://{}", args.bind);
    println!("  Room: {}, Entity: {}", args.room, args.entity);
    println!(
        "  Center: ({}, {}), Radius: {}m, Speed: {}m/s",
        args.lat, args.lon, args.radius, args.speed
    );
    println!();

    loop {
        let (stream, peer) = listener.accept().await?;
        let args = args.clone();
        tokio::spawn(async move {
            if let Err(e) = serve_client(stream, peer, &args, period).await {
                eprintln!("[{}] Session error: {:#}", peer, e);
            }
        });
    }
}

async fn serve_client(
    stream: TcpStream,
    peer: SocketAddr,
    args: &Args,
    period: Duration,
) -> Result<()> {
    let expected = args.token.clone();
    let check_auth = move |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
        let authorization = req
            .headers()
            .get("Authorization")
            .and_then(|v| v.to_str().ok());
        let presented = presented_token(authorization, req.uri().query());
        if is_authorized(expected.as_deref(), presented.as_deref()) {
            Ok(resp)
        } else {
            let mut denied = ErrorResponse::new(Some("unauthorized".to_string()));
            *denied.status_mut() = StatusCode::UNAUTHORIZED;
            Err(denied)
        }
    };
    let mut ws = tokio_tungstenite::accept_hdr_async(stream, check_auth)
        .await
        .context("Handshake failed")?;
    println!("[{}] Connected", peer);

    wait_for_join(&mut ws, &args.room).await?;
    println!("[{}] Joined '{}'", peer, args.room);

    let path = CircularPath::new(args.lat, args.lon, args.radius, args.speed, true);
    let decoy = CircularPath::new(args.lat, args.lon, args.radius * 2.0, args.speed, false);
    let style = if args.string_payloads {
        PayloadStyle::Serialized
    } else {
        PayloadStyle::Object
    };

    let start = time::Instant::now();
    let mut interval = time::interval(period);
    let mut sent = 0u32;

    loop {
        interval.tick().await;

        let elapsed = start.elapsed().as_secs_f64();
        if elapsed > args.duration as f64 {
            break;
        }

        let (lat, lon) = path.position(elapsed);
        let heading = (!args.omit_heading).then(|| path.heading(elapsed));
        send_observation(&mut ws, &args.room, &args.entity, lat, lon, heading, style).await?;
        sent += 1;
        println!(
            "[{:4}] {} ({:.7}, {:.7}) heading {}",
            sent,
            args.entity,
            lat,
            lon,
            heading.map_or_else(|| "-".to_string(), |h| format!("{:.1}", h))
        );

        if args.decoy {
            let (lat, lon) = decoy.position(elapsed);
            let heading = Some(decoy.heading(elapsed));
            send_observation(&mut ws, &args.room, "DECOY0", lat, lon, heading, style).await?;
        }
    }

    ws.close(None).await.ok();
    println!("[{}] Done. Sent {} observations.", peer, sent);
    Ok(())
}

async fn wait_for_join(ws: &mut WebSocketStream<TcpStream>, room: &str) -> Result<()> {
    while let Some(msg) = ws.next().await {
        if let Message::Text(text) = msg? {
            match serde_json::from_str::<Envelope>(&text) {
                Ok(envelope) if envelope.joined_room() == Some(room) => return Ok(()),
                Ok(envelope) => eprintln!("Ignoring '{}' before join", envelope.event),
                Err(e) => eprintln!("Ignoring unparseable frame: {}", e),
            }
        }
    }
    anyhow::bail!("Client left before joining '{}'", room)
}

async fn send_observation(
    ws: &mut WebSocketStream<TcpStream>,
    room: &str,
    entity: &str,
    lat: f64,
    lon: f64,
    heading: Option<f64>,
    style: PayloadStyle,
) -> Result<()> {
    let payload = observation_payload(entity, lat, lon, heading, style);
    let frame = serde_json::to_string(&Envelope::room_message(room, payload))?;
    ws.send(Message::Text(frame)).await?;
    Ok(())
}
