//! End-to-end run of the basin analysis against a canned platform: checks
//! the materialization order, the locally derived statistics, and the chart
//! outputs without touching the network.

use std::collections::VecDeque;
use std::sync::Mutex;

use serde_json::{json, Value};

use rsbasin::analysis::basin;
use rsbasin::engine::session::Session;
use rsbasin::engine::transport::Transport;
use rsbasin::EngineError;

struct MockPlatform {
    responses: Mutex<VecDeque<Value>>,
    requests: Mutex<Vec<Value>>,
}

impl MockPlatform {
    fn new(responses: Vec<Value>) -> Self {
        MockPlatform {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        }
    }
}

impl Transport for MockPlatform {
    fn compute(&self, _project: &str, expression: &Value) -> Result<Value, EngineError> {
        self.requests.lock().unwrap().push(expression.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| EngineError::MalformedResponse("unexpected extra request".to_string()))
    }
}

fn sample_response() -> Value {
    json!({
        "type": "FeatureCollection",
        "features": [
            { "type": "Feature", "geometry": null,
              "properties": { "ndvi": 0.62, "nbr": 0.44, "B4": 0.07, "B5": 0.29 } },
            { "type": "Feature", "geometry": null,
              "properties": { "ndvi": 0.18, "nbr": 0.05, "B4": 0.15, "B5": 0.21 } },
            { "type": "Feature", "geometry": null,
              "properties": { "ndvi": 0.35, "nbr": 0.22, "B4": 0.11, "B5": 0.24 } }
        ]
    })
}

/// Responses in the pipeline's materialization order: total river length,
/// main-channel length, mean distance, riparian median, upland median,
/// pixel sample.
fn canned_responses() -> Vec<Value> {
    vec![
        json!(1480.0),
        json!(1110.0),
        json!(23.7),
        json!(0.41),
        json!(0.29),
        sample_response(),
    ]
}

#[test]
fn test_pipeline_report_and_charts() {
    let session = Session::with_transport(
        "test-project",
        Box::new(MockPlatform::new(canned_responses())),
    );

    let out_dir = tempfile::tempdir().unwrap();
    let report = basin::run(&session, out_dir.path()).unwrap();

    // Percentage is local arithmetic over the two fetched sums.
    assert!((report.main_channel_percentage - 75.0).abs() < 1e-9);
    assert!(report.main_channel_percentage >= 0.0 && report.main_channel_percentage <= 100.0);

    // Scalar reductions pass through verbatim and stay in the valid
    // normalized-difference range.
    assert_eq!(report.mean_distance_km, 23.7);
    assert_eq!(report.median_riparian_ndvi, 0.41);
    assert_eq!(report.median_upland_ndvi, 0.29);
    assert!((-1.0..=1.0).contains(&report.median_riparian_ndvi));
    assert!((-1.0..=1.0).contains(&report.median_upland_ndvi));

    assert_eq!(report.sampled_pixels, 3);

    // Both chart documents exist, with the data embedded.
    assert_eq!(report.charts.len(), 2);
    for path in &report.charts {
        assert!(path.exists(), "missing chart {}", path.display());
    }
    let histogram =
        std::fs::read_to_string(out_dir.path().join(basin::NDVI_HISTOGRAM_FILE)).unwrap();
    assert!(histogram.contains("\"ndvi\""));
    let scatter = std::fs::read_to_string(out_dir.path().join(basin::B4_B5_SCATTER_FILE)).unwrap();
    assert!(scatter.contains("\"B5\""));
}

#[test]
fn test_pipeline_rejects_zero_total_river_length() {
    let session = Session::with_transport(
        "test-project",
        Box::new(MockPlatform::new(vec![json!(0.0), json!(0.0)])),
    );

    let out_dir = tempfile::tempdir().unwrap();
    let err = basin::run(&session, out_dir.path()).unwrap_err();
    assert!(format!("{err:#}").contains("total river length"));
}

#[test]
fn test_pipeline_requests_shape() {
    let platform = std::sync::Arc::new(MockPlatform::new(canned_responses()));

    struct Shared(std::sync::Arc<MockPlatform>);
    impl Transport for Shared {
        fn compute(&self, project: &str, expression: &Value) -> Result<Value, EngineError> {
            self.0.compute(project, expression)
        }
    }

    let session = Session::with_transport("test-project", Box::new(Shared(platform.clone())));
    let out_dir = tempfile::tempdir().unwrap();
    basin::run(&session, out_dir.path()).unwrap();

    let requests = platform.requests.lock().unwrap();
    assert_eq!(requests.len(), 6, "one request per materialization point");
    assert!(platform.responses.lock().unwrap().is_empty());

    // Length sums: dictionary lookups over column reductions of LENGTH_KM.
    for request in &requests[0..2] {
        assert_eq!(request["functionName"], "Dictionary.get");
        let serialized = request.to_string();
        assert!(serialized.contains("Collection.reduceColumns"));
        assert!(serialized.contains("LENGTH_KM"));
    }
    assert!(requests[1].to_string().contains("Filter.expression"));

    // Mean distance rides on the mapped distance attribute.
    let mean_request = requests[2].to_string();
    assert!(mean_request.contains("Reducer.mean"));
    assert!(mean_request.contains("distance_km"));
    assert!(mean_request.contains("functionDefinition"));

    // Zonal medians reduce the clipped composite over each derived zone.
    let riparian_request = requests[3].to_string();
    assert!(riparian_request.contains("Image.reduceRegion"));
    assert!(riparian_request.contains("Geometry.buffer"));
    let upland_request = requests[4].to_string();
    assert!(upland_request.contains("Geometry.difference"));

    // The sample asks for exactly the configured pixel count.
    let sample_request = &requests[5];
    assert_eq!(sample_request["functionName"], "Image.sample");
    assert_eq!(
        sample_request["arguments"]["numPixels"],
        json!({ "constantValue": 1000 })
    );
    assert_eq!(
        sample_request["arguments"]["scale"],
        json!({ "constantValue": 30.0 })
    );
}
