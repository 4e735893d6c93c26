//! Stream an answer from a role-specific assistant and print it as it arrives.
//!
//! Run with:
//! ```bash
//! export SSE_RELAY_BASE_URL="http://localhost:8000/api/v1"
//! RUST_LOG=sse_relay=debug cargo run --example stream_chat -- marketing-expert "Pitch me a slogan"
//! ```

use std::io::Write;

use serde::Serialize;
use sse_relay::providers::HttpStreamClient;
use sse_relay::{Callbacks, StreamRequest, StreamingClient};
use tracing_subscriber::EnvFilter;

#[derive(Serialize)]
struct QueryRequest {
    role_id: String,
    query: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let role_id = args.next().unwrap_or_else(|| "marketing-expert".to_string());
    let query = args
        .next()
        .unwrap_or_else(|| "Give me three ideas for a product launch.".to_string());

    let client = HttpStreamClient::from_env();
    let request = StreamRequest::post("/roles/process/stream").with_json(&QueryRequest { role_id, query })?;

    let mut answer = String::new();
    let mut callbacks = Callbacks::new(
        |text: String| {
            print!("{}", text);
            let _ = std::io::stdout().flush();
            answer.push_str(&text);
        },
        |err| eprintln!("\n[error] {}", err),
        || println!("\n\n=== Stream Complete ==="),
    );

    let outcome = client.stream(request, &mut callbacks).await;
    drop(callbacks);

    println!(
        "state: {:?}, chunks: {}, characters: {}",
        outcome.state,
        outcome.chunks,
        answer.chars().count()
    );
    Ok(())
}
