use rulcore::client::{PredictionClient, PredictionService};
use rulcore::ingest::Record;
use rulcore::pipeline::{Outcome, Pipeline};
use rulcore::{PipelineError, RequestError, Subsystem};
use serde_json::{json, Value};
use std::net::{SocketAddr, TcpListener};
use std::time::Duration;
use warp::http::StatusCode;
use warp::Filter;

/// Serves a fixed set of prediction routes on an ephemeral loopback port.
fn spawn_service() -> SocketAddr {
    let engine_single = warp::path!("predict" / "engine")
        .and(warp::post())
        .and(warp::body::json())
        .map(|_body: Value| {
            warp::reply::json(&json!({
                "predicted_rul": 101.5,
                "units": "cycles",
                "model_version": "best_model_fd001"
            }))
        });

    // Echoes op_setting_3 back as the estimate and labels each entry.
    let engine_batch = warp::path!("predict" / "engine" / "batch")
        .and(warp::post())
        .and(warp::body::json())
        .map(|body: Value| {
            let predictions: Vec<Value> = body["items"]
                .as_array()
                .map(|items| {
                    items
                        .iter()
                        .enumerate()
                        .map(|(index, item)| {
                            json!({
                                "predicted_rul": item["op_setting_3"],
                                "units": "cycles",
                                "index": index
                            })
                        })
                        .collect()
                })
                .unwrap_or_default();
            warp::reply::json(&json!({ "predictions": predictions }))
        });

    // Drops the last prediction.
    let hydraulics_batch = warp::path!("predict" / "hydraulics" / "batch")
        .and(warp::post())
        .and(warp::body::json())
        .map(|body: Value| {
            let count = body["items"].as_array().map(Vec::len).unwrap_or(0);
            let predictions: Vec<Value> = (1..count)
                .map(|_| json!({"predicted_rul": 50.0, "units": "cycles"}))
                .collect();
            warp::reply::json(&json!({ "predictions": predictions }))
        });

    let gear_batch = warp::path!("predict" / "landing-gear" / "batch")
        .and(warp::post())
        .and(warp::body::json())
        .map(|_body: Value| {
            warp::reply::with_status(
                warp::reply::json(&json!({"detail": "ValueError: shape mismatch"})),
                StatusCode::BAD_REQUEST,
            )
        });

    let gear_single = warp::path!("predict" / "landing-gear")
        .and(warp::post())
        .and(warp::body::json())
        .and_then(|_body: Value| async {
            tokio::time::sleep(Duration::from_secs(2)).await;
            Ok::<_, warp::Rejection>(warp::reply::json(&json!({"predicted_rul": 1.0})))
        });

    let health = warp::path!("health")
        .and(warp::get())
        .map(|| warp::reply::json(&json!({"status": "ok", "version": "1.0.0"})));

    let routes = engine_single
        .or(engine_batch)
        .or(hydraulics_batch)
        .or(gear_batch)
        .or(gear_single)
        .or(health);

    let (addr, server) = warp::serve(routes).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);
    addr
}

fn client_for(addr: SocketAddr, timeout: Duration) -> PredictionClient {
    PredictionClient::new(&format!("http://{addr}/"), timeout).unwrap()
}

const ENGINE_FILE: &str = "\
sensor_12,op_setting_1,op_setting_2,op_setting_3,sensor_11,sensor_4,cycle
520,0,0,100,47,1400,1
521,0,0,90,47,1401,2
519,0,0,80,48,1399,3
";

const HYDRAULICS_FILE: &str = "\
PS6_mean,PS5_mean,CE_mean,TS4_mean,TS2_mean,TS1_mean,CP_mean,TS3_mean
10,9.5,31,52,47,45,1.8,48
10,9.4,30,51,46,44,1.7,47
";

#[tokio::test]
async fn batch_round_trip_keeps_file_order() {
    let addr = spawn_service();
    let client = client_for(addr, Duration::from_secs(5));
    let mut pipeline = Pipeline::new();

    let outcome = pipeline
        .submit_batch(&client, Subsystem::Engine, ENGINE_FILE)
        .await
        .unwrap();
    assert_eq!(outcome, Outcome::Committed(3));

    let rows = pipeline.store().get(Subsystem::Engine).rows();
    let estimates: Vec<f64> = rows.iter().filter_map(|row| row.predicted_rul()).collect();
    assert_eq!(estimates, vec![100.0, 90.0, 80.0]);
    assert_eq!(rows[2].record.get("cycle").unwrap().to_string(), "3");
}

#[tokio::test]
async fn single_prediction_sets_kpi() {
    let addr = spawn_service();
    let client = client_for(addr, Duration::from_secs(5));
    let mut pipeline = Pipeline::new();

    let record = Record::from_pairs([("op_setting_3", "100")]);
    let outcome = pipeline
        .submit_single(&client, Subsystem::Engine, &record)
        .await
        .unwrap();
    match outcome {
        Outcome::Committed(result) => {
            assert_eq!(result.model_version.as_deref(), Some("best_model_fd001"))
        }
        Outcome::Ignored => panic!("prediction was ignored"),
    }
    assert_eq!(pipeline.store().get(Subsystem::Engine).kpi_display(), "101.50");
}

#[tokio::test]
async fn short_batch_response_is_rejected_as_a_whole() {
    let addr = spawn_service();
    let client = client_for(addr, Duration::from_secs(5));
    let mut pipeline = Pipeline::new();

    let err = pipeline
        .submit_batch(&client, Subsystem::Hydraulics, HYDRAULICS_FILE)
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Merge(_)));
    assert!(pipeline.store().get(Subsystem::Hydraulics).rows().is_empty());
}

#[tokio::test]
async fn service_detail_becomes_the_error_message() {
    let addr = spawn_service();
    let client = client_for(addr, Duration::from_secs(5));
    let mut pipeline = Pipeline::new();

    let err = pipeline
        .submit_batch(
            &client,
            Subsystem::LandingGear,
            "load_during_landing,tire_pressure,speed_during_landing\n75,32.5,160\n",
        )
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "ValueError: shape mismatch");
    assert!(matches!(
        err,
        PipelineError::Request(RequestError::Status { status: 400, .. })
    ));
}

#[tokio::test]
async fn slow_service_times_out() {
    let addr = spawn_service();
    let client = client_for(addr, Duration::from_millis(200));
    let payload = rulcore::processing::sanitize_record(
        Subsystem::LandingGear.schema(),
        &Record::default(),
    );

    let err = client
        .predict_single(Subsystem::LandingGear, &payload)
        .await
        .unwrap_err();
    assert_eq!(err, RequestError::Timeout(Duration::from_millis(200)));
}

#[tokio::test]
async fn stalled_error_body_is_a_timeout() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = [0u8; 4096];
        let _ = socket.read(&mut request).await;
        socket
            .write_all(b"HTTP/1.1 500 Internal Server Error\r\ncontent-type: application/json\r\ncontent-length: 64\r\n\r\n{\"detail\":")
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_secs(2)).await;
    });

    let client = client_for(addr, Duration::from_millis(300));
    let err = client.health().await.unwrap_err();
    assert_eq!(err, RequestError::Timeout(Duration::from_millis(300)));
}

#[tokio::test]
async fn unreachable_service_is_a_connection_error() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let client = PredictionClient::new(&format!("http://127.0.0.1:{port}"), Duration::from_secs(2)).unwrap();
    let err = client.health().await.unwrap_err();
    assert!(matches!(err, RequestError::Connection(_)));
}

#[tokio::test]
async fn health_reports_service_version() {
    let addr = spawn_service();
    let client = client_for(addr, Duration::from_secs(5));
    let health = client.health().await.unwrap();
    assert_eq!(health.status, "ok");
    assert_eq!(health.version.as_deref(), Some("1.0.0"));
}
