//! Unit tests for configuration parsing.

use rstest::rstest;

use super::*;

fn parse(args: &[&str]) -> Result<Config, ConfigError> {
    let mut argv = vec!["courier-worker"];
    argv.extend_from_slice(args);
    Config::load_from_iter(argv)
}

#[rstest]
fn explicit_flags_override_defaults() {
    let config = parse(&[
        "--protocol",
        "ftp",
        "--transport",
        "tcp://127.0.0.1:7000",
        "--log-filter",
        "debug",
        "--log-format",
        "json",
    ])
    .expect("parse");

    assert_eq!(config.protocol(), "ftp");
    assert_eq!(config.transport(), &TransportEndpoint::tcp("127.0.0.1", 7000));
    assert_eq!(config.log_filter(), "debug");
    assert_eq!(config.log_format(), LogFormat::Json);
}

#[rstest]
#[case("stdio", TransportEndpoint::Stdio)]
#[case("STDIO", TransportEndpoint::Stdio)]
#[case("unix:///run/courier.sock", TransportEndpoint::unix("/run/courier.sock"))]
fn transport_flag_accepts_every_endpoint_kind(
    #[case] flag: &str,
    #[case] expected: TransportEndpoint,
) {
    let config = parse(&["--transport", flag]).expect("parse");
    assert_eq!(config.transport(), &expected);
}

#[rstest]
#[case("ftp://host:21")]
#[case("tcp://host")]
fn invalid_transport_is_rejected(#[case] flag: &str) {
    let err = parse(&["--transport", flag]).expect_err("should fail");
    assert!(!err.is_informational());
}

#[test]
fn help_request_is_informational() {
    let err = parse(&["--help"]).expect_err("help short-circuits parsing");
    assert!(err.is_informational());
}

#[test]
fn builder_methods_replace_fields() {
    let config = Config::default()
        .with_protocol("sftp")
        .with_log_filter("trace")
        .with_transport(TransportEndpoint::tcp("localhost", 9));
    assert_eq!(config.protocol(), "sftp");
    assert_eq!(config.log_filter(), "trace");
    assert_eq!(config.transport().to_string(), "tcp://localhost:9");
}

#[rstest]
#[case("json", LogFormat::Json)]
#[case("Compact", LogFormat::Compact)]
fn log_format_parses_case_insensitively(#[case] text: &str, #[case] expected: LogFormat) {
    assert_eq!(text.parse::<LogFormat>().expect("parse"), expected);
}

#[test]
fn display_round_trips_unix_endpoint() {
    let endpoint = TransportEndpoint::unix("/tmp/courier.sock");
    assert_eq!(endpoint.to_string(), "unix:///tmp/courier.sock");
    assert_eq!(endpoint.unix_path().map(|path| path.as_str()), Some("/tmp/courier.sock"));
}
