//! Tests for metric samples and line encoding

use network_monitor::core::{InMemoryMetricSink, MetricSink, MetricValue, Sample};
use network_monitor::infra::encode_line;

#[test]
fn test_sample_tags_and_values() {
    let sample = Sample::new("net")
        .tag("type", "http")
        .tag("result", "success")
        .value("duration", 42_i64)
        .value("bandwidth", 93.5);

    assert_eq!(sample.tag_value("type"), Some("http"));
    assert_eq!(sample.values["duration"], MetricValue::Int(42));
    assert_eq!(sample.values["bandwidth"], MetricValue::Float(93.5));
}

#[test]
fn test_encode_http_sample() {
    let sample = Sample::new("network-monitor")
        .tag("type", "http")
        .tag("method", "GET")
        .tag("url", "http://example.com")
        .tag("result", "success")
        .value("duration", 120_i64);

    assert_eq!(
        encode_line(&sample).unwrap(),
        "network-monitor,method=GET,result=success,type=http,url=http://example.com duration=120i\n"
    );
}

#[test]
fn test_encode_text_value() {
    let sample = Sample::new("net")
        .tag("type", "iperf3")
        .value("server", "192.0.2.1");
    assert_eq!(
        encode_line(&sample).unwrap(),
        "net,type=iperf3 server=\"192.0.2.1\"\n"
    );
}

#[tokio::test]
async fn test_in_memory_sink_keeps_latest() {
    let sink = InMemoryMetricSink::new(2);
    for i in 0..3_i64 {
        sink.record(Sample::new("net").value("n", i)).await;
    }
    let samples = sink.samples();
    assert_eq!(samples.len(), 2);
    assert_eq!(samples[0].values["n"], MetricValue::Int(1));
    assert_eq!(samples[1].values["n"], MetricValue::Int(2));
}
