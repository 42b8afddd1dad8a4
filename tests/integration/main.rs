//! Integration tests for the sweep
//!
//! These tests use wiremock to serve the lookup, safety and registration
//! pages and run whole sweeps through the real HTTP fetcher.

use safer_sweep::config::{Config, Mode};
use safer_sweep::crawler::{lookup_url, RunController};
use safer_sweep::output::ContactRecord;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock server
fn create_test_config(base_url: &str, output_dir: &TempDir, mode: Mode) -> Config {
    let mut config = Config::default();
    config.run.mode = mode;
    config.run.concurrency = 2;
    config.run.delay = 10;
    config.run.batch_size = 2;
    config.network.lookup_url_template =
        format!("{}/query.asp?query_string={{identifier}}", base_url);
    config.network.timeout_secs = 5;
    config.network.max_attempts = 2;
    config.network.backoff_base_ms = 10;
    config.network.hop_delay_ms = 0;
    config.output.directory = output_dir.path().to_string_lossy().into_owned();
    config
}

fn snapshot_page(id: &str, power_units: u32, extra: &str) -> String {
    format!(
        r#"<html><body><table>
        <tr><th>Phone:</th><td class="queryfield">(555) 321-0000</td></tr>
        <tr><th><a href="/help">Power Units:</a></th><td class="queryfield">{}</td></tr>
        <tr><th>MC/MX/FF Number(s):</th><td class="queryfield"><a href="/mc">MC-{}</a></td></tr>
        </table>{}</body></html>"#,
        power_units, id, extra
    )
}

async fn mount_lookup(server: &MockServer, id: &str, body: String, expected: u64) {
    Mock::given(method("GET"))
        .and(path("/query.asp"))
        .and(query_param("query_string", id))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .expect(expected)
        .mount(server)
        .await;
}

fn ids(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_invalid_and_linkless_identifiers() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let output_dir = TempDir::new().unwrap();

    mount_lookup(
        &mock_server,
        "000001",
        "<html><h3>Record Not Found</h3></html>".to_string(),
        1,
    )
    .await;
    mount_lookup(&mock_server, "000002", snapshot_page("000002", 12, ""), 1).await;

    // Nothing beyond the lookup page may be requested
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&base_url, &output_dir, Mode::Both);
    let controller = RunController::new(&config).expect("Failed to create controller");
    let report = controller
        .run(&ids(&["000001", "000002"]))
        .await
        .expect("Sweep failed");

    assert_eq!(
        report.accumulator.records(),
        [ContactRecord {
            email: String::new(),
            registry_number: "MC-000002".to_string(),
            phone: "(555) 321-0000".to_string(),
            source_url: lookup_url(&config.network.lookup_url_template, "000002"),
        }]
    );
    assert_eq!(report.statistics.not_found, 1);

    let checkpoint = report.last_checkpoint.expect("No checkpoint written");
    let text = std::fs::read_to_string(checkpoint).unwrap();
    assert_eq!(
        text,
        format!(
            "\"email\",\"registryNumber\",\"phone\",\"sourceURL\"\n\"\",\"MC-000002\",\"(555) 321-0000\",\"{}\"\n",
            lookup_url(&config.network.lookup_url_template, "000002")
        )
    );
}

#[tokio::test]
async fn test_full_three_hop_extraction() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let output_dir = TempDir::new().unwrap();

    mount_lookup(
        &mock_server,
        "424242",
        snapshot_page(
            "424242",
            3,
            r#"<a href="/SMS/Carrier/9001/CarrierOverview.aspx">SMS Results</a>"#,
        ),
        1,
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/SMS/Carrier/9001/CarrierOverview.aspx"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<nav><a href="CarrierRegistration.aspx">Carrier Registration</a></nav>"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/SMS/Carrier/9001/CarrierRegistration.aspx"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<ul>
                <li><label>Telephone:</label><span class="dat">(555) 900-1234</span></li>
                <li><label>Email:</label><span class="dat">Safety@Example-Freight.com</span></li>
            </ul>"#,
        ))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&base_url, &output_dir, Mode::Both);
    let controller = RunController::new(&config).expect("Failed to create controller");
    let report = controller.run(&ids(&["424242"])).await.expect("Sweep failed");

    assert_eq!(report.accumulator.len(), 1);
    let record = &report.accumulator.records()[0];
    assert_eq!(record.email, "Safety@Example-Freight.com");
    assert_eq!(record.registry_number, "MC-424242");
    assert_eq!(record.phone, "(555) 900-1234");
    assert_eq!(
        record.source_url,
        lookup_url(&config.network.lookup_url_template, "424242")
    );
}

#[tokio::test]
async fn test_safety_page_errors_degrade_record() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let output_dir = TempDir::new().unwrap();

    mount_lookup(
        &mock_server,
        "555000",
        snapshot_page(
            "555000",
            7,
            r#"<a href="/SMS/Carrier/1/CarrierOverview.aspx">SMS</a>"#,
        ),
        1,
    )
    .await;

    // Retried up to the attempt cap, then given up on
    Mock::given(method("GET"))
        .and(path("/SMS/Carrier/1/CarrierOverview.aspx"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&base_url, &output_dir, Mode::Both);
    let controller = RunController::new(&config).expect("Failed to create controller");
    let report = controller.run(&ids(&["555000"])).await.expect("Sweep failed");

    let record = &report.accumulator.records()[0];
    assert_eq!(record.registry_number, "MC-555000");
    assert_eq!(record.phone, "(555) 321-0000");
    assert_eq!(record.email, "");
    assert_eq!(report.statistics.failed, 0);
}

#[tokio::test]
async fn test_lookup_failure_skips_identifier() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let output_dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/query.asp"))
        .and(query_param("query_string", "100"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&mock_server)
        .await;
    mount_lookup(&mock_server, "200", snapshot_page("200", 5, ""), 1).await;

    let config = create_test_config(&base_url, &output_dir, Mode::Both);
    let controller = RunController::new(&config).expect("Failed to create controller");
    let report = controller
        .run(&ids(&["100", "200"]))
        .await
        .expect("Sweep failed");

    assert_eq!(report.accumulator.len(), 1);
    assert_eq!(report.accumulator.records()[0].registry_number, "MC-200");
    assert_eq!(report.statistics.failed, 1);
}

#[tokio::test]
async fn test_urls_mode_lists_valid_lookup_urls() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();
    let output_dir = TempDir::new().unwrap();

    let sweep_ids = ids(&["11", "22", "33"]);
    for id in &sweep_ids {
        mount_lookup(
            &mock_server,
            id,
            snapshot_page(
                id,
                4,
                r#"<a href="/SMS/Carrier/5/CarrierOverview.aspx">SMS</a>"#,
            ),
            1,
        )
        .await;
    }

    // Deep pages are never visited in urls mode
    Mock::given(method("GET"))
        .and(path("/SMS/Carrier/5/CarrierOverview.aspx"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&base_url, &output_dir, Mode::Urls);
    let controller = RunController::new(&config).expect("Failed to create controller");
    let report = controller.run(&sweep_ids).await.expect("Sweep failed");

    let expected: String = sweep_ids
        .iter()
        .map(|id| format!("{}\n", lookup_url(&config.network.lookup_url_template, id)))
        .collect();
    let url_list = report.url_list.expect("No URL list written");
    assert_eq!(std::fs::read_to_string(url_list).unwrap(), expected);

    // Two batches of two, so two snapshots plus the stable latest file
    let csv_files = std::fs::read_dir(output_dir.path())
        .unwrap()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_string_lossy().starts_with("results_2"))
        .count();
    assert_eq!(csv_files, 2);

    let latest = std::fs::read_to_string(output_dir.path().join("results_latest.csv")).unwrap();
    assert_eq!(latest.lines().count(), 4);
    assert!(latest.lines().skip(1).all(|line| line.starts_with(r#""","","","#)));
}
