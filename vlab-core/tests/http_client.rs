//! The real blocking HTTP client against a local one-shot server.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use chrono::NaiveDate;
use vlab_core::catalog::{RemoteCatalog, StaticCatalog};
use vlab_core::config::ApiConfig;
use vlab_core::{
    BacktestClient, BacktestConfiguration, ClientError, ConfigPatch, HttpBacktestClient,
    StrategyCatalog, WorkflowController, WorkflowState,
};

/// Accept one connection, capture the request, reply with `status` and `body`.
fn one_shot(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(stream.try_clone().unwrap());

        let mut head = String::new();
        let mut content_length = 0usize;
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).unwrap();
            if let Some(v) = line.to_ascii_lowercase().strip_prefix("content-length:") {
                content_length = v.trim().parse().unwrap();
            }
            head.push_str(&line);
            if line == "\r\n" || line.is_empty() {
                break;
            }
        }
        let mut request_body = vec![0u8; content_length];
        reader.read_exact(&mut request_body).unwrap();

        let mut stream = stream;
        write!(
            stream,
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
        .unwrap();
        stream.flush().unwrap();

        head + &String::from_utf8(request_body).unwrap()
    });

    (base_url, handle)
}

fn api(base_url: String) -> ApiConfig {
    ApiConfig {
        base_url,
        timeout_secs: 5,
        ..ApiConfig::default()
    }
}

fn config() -> BacktestConfiguration {
    BacktestConfiguration {
        strategy_id: "simple_moving_average".into(),
        symbol: "AAPL".into(),
        start_date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2023, 6, 1).unwrap(),
    }
}

#[test]
fn posts_json_and_parses_success() {
    let (base, server) = one_shot(
        "200 OK",
        r#"{"symbol":"AAPL","strategy_display_name":"Simple Moving Average","total_return":0.153,"sharpe_ratio":1.85,"max_drawdown":-0.082,"equity_curve":[100,110,103],"signals":[0,1,0]}"#,
    );
    let client = HttpBacktestClient::new(&api(base)).unwrap();
    let raw = client.run(&config()).unwrap();
    assert_eq!(raw.sharpe_ratio, Some(1.85));
    assert_eq!(raw.equity_curve.map(|c| c.len()), Some(3));

    let request = server.join().unwrap();
    assert!(request.starts_with("POST /backtest/run HTTP/1.1"));
    assert!(request.contains(r#""strategy_name":"simple_moving_average""#));
    assert!(request.contains(r#""start_date":"2023-01-01""#));
    assert!(request.contains(r#""parameters":{}"#));
}

#[test]
fn status_error_carries_detail() {
    let (base, server) = one_shot("500 Internal Server Error", r#"{"detail":"symbol not found"}"#);
    let client = HttpBacktestClient::new(&api(base)).unwrap();
    let err = client.run(&config()).unwrap_err();
    assert!(matches!(err, ClientError::Status { status: 500, .. }));
    assert_eq!(err.user_message(), "symbol not found");
    server.join().unwrap();
}

#[test]
fn controller_surfaces_server_detail() {
    let (base, server) = one_shot("500 Internal Server Error", r#"{"detail":"symbol not found"}"#);
    let client = Arc::new(HttpBacktestClient::new(&api(base)).unwrap());
    let mut c = WorkflowController::new(Arc::new(StaticCatalog::builtin()), client)
        .unwrap()
        .with_today(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());

    c.select_strategy_by_id("simple_moving_average");
    c.update_config(
        ConfigPatch::new()
            .symbol("AAPL")
            .start_date(NaiveDate::from_ymd_opt(2023, 1, 1).unwrap())
            .end_date(NaiveDate::from_ymd_opt(2023, 6, 1).unwrap()),
    );
    c.submit();
    assert!(c.wait(Duration::from_secs(10)));

    match c.state() {
        WorkflowState::Failed { message, .. } => assert_eq!(message, "symbol not found"),
        other => panic!("expected Failed, got {other:?}"),
    }
    server.join().unwrap();
}

#[test]
fn unreachable_host_is_transport_error() {
    // Bind then drop to get a port nobody listens on.
    let port = TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let client = HttpBacktestClient::new(&api(format!("http://127.0.0.1:{port}"))).unwrap();
    let err = client.run(&config()).unwrap_err();
    assert!(matches!(err, ClientError::Transport(_) | ClientError::Timeout(_)));
}

#[test]
fn remote_catalog_normalizes_wrapped_ids() {
    let (base, server) = one_shot(
        "200 OK",
        r#"{"strategies":["simple_moving_average","rsi_strategy"]}"#,
    );
    let client = Arc::new(HttpBacktestClient::new(&api(base)).unwrap());
    let catalog = RemoteCatalog::new(client, StaticCatalog::builtin());
    let list = catalog.load().unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[1].name, "Relative Strength Index");
    assert!(!list[0].bullet_points.is_empty());

    let request = server.join().unwrap();
    assert!(request.starts_with("GET /backtest/strategies HTTP/1.1"));
}
