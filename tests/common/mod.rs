// Shared test helpers

use axum::Router;
use natsmon::models::Varz;

pub fn varz_at(now: &str) -> Varz {
    Varz {
        server_id: "NCTESTSERVERID".into(),
        server_name: "test-server".into(),
        version: "2.10.14".into(),
        uptime: "2d3h".into(),
        now: now.into(),
        cpu: 12.5,
        mem: 50 * 1024 * 1024,
        connections: 3,
        total_connections: 10,
        subscriptions: 42,
        slow_consumers: 0,
        in_msgs: 0,
        out_msgs: 0,
        in_bytes: 0,
        out_bytes: 0,
    }
}

/// Serve `app` on an ephemeral local port; returns its base URL.
#[allow(dead_code)]
pub async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local_addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve mock varz");
    });
    format!("http://{addr}")
}
